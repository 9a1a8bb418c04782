//! Catalog index: leaf id -> (product, ancestor category ids)

use std::collections::HashMap;

use serde::Serialize;
use shared::models::Product;

/// One indexed product with every category it sits under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub product: Product,
    /// Ancestor category ids, outermost first, without duplicates
    pub categories: Vec<String>,
}

impl CatalogEntry {
    pub fn in_category(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c == category_id)
    }

    fn merge_categories<'a>(&mut self, categories: impl IntoIterator<Item = &'a String>) {
        for category in categories {
            if !self.in_category(category) {
                self.categories.push(category.clone());
            }
        }
    }
}

/// Entries keyed by id, iterated in insertion order
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: HashMap<String, CatalogEntry>,
    order: Vec<String>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Insert or merge an entry
    ///
    /// An existing entry keeps its product and gains any new category ids.
    /// Returns `true` when the id was not indexed before.
    pub fn upsert(&mut self, id: &str, product: Product, categories: &[String]) -> bool {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.merge_categories(categories);
            return false;
        }

        let mut entry = CatalogEntry {
            id: id.to_string(),
            product,
            categories: Vec::with_capacity(categories.len()),
        };
        entry.merge_categories(categories);
        self.entries.insert(id.to_string(), entry);
        self.order.push(id.to_string());
        true
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All entries in insertion order
    pub fn all(&self) -> Vec<&CatalogEntry> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries whose ancestor path contains `category_id`
    pub fn in_category(&self, category_id: &str) -> Vec<&CatalogEntry> {
        self.iter().filter(|e| e.in_category(category_id)).collect()
    }
}
