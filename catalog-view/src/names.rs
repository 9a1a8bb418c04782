//! Category name cache
//!
//! Memoizes id -> name resolution and the composed `"a > b > c"` labels used
//! both for the `categories` sort key and for rendering. Paths are always
//! composed in the order given, which throughout this crate is
//! outermost-first.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Separator between category names in a composed path
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Default)]
pub struct CategoryNameCache {
    /// id -> name, as collected from the category tree
    names: HashMap<String, String>,
    resolved: RwLock<HashMap<String, Arc<str>>>,
    paths: RwLock<HashMap<Vec<String>, Arc<str>>>,
}

impl CategoryNameCache {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self {
            names,
            resolved: RwLock::new(HashMap::new()),
            paths: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    /// Name for a category id, or the id itself when unknown
    pub fn resolve_name(&self, id: &str) -> Arc<str> {
        if let Some(name) = self.resolved.read().get(id) {
            return name.clone();
        }

        let name: Arc<str> = match self.names.get(id) {
            Some(name) => Arc::from(name.as_str()),
            None => {
                tracing::trace!(category_id = %id, "Unknown category id, using id as name");
                Arc::from(id)
            }
        };
        self.resolved
            .write()
            .entry(id.to_string())
            .or_insert(name)
            .clone()
    }

    /// Resolved names joined with [`PATH_SEPARATOR`], in the order given
    pub fn compose_path(&self, ids: &[String]) -> Arc<str> {
        if let Some(path) = self.paths.read().get(ids) {
            return path.clone();
        }

        let path: Arc<str> = ids
            .iter()
            .map(|id| self.resolve_name(id))
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
            .into();
        self.paths
            .write()
            .entry(ids.to_vec())
            .or_insert(path)
            .clone()
    }
}
