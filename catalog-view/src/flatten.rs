//! Category tree flattening
//!
//! One depth-first pass over a tagged tree yields:
//! - every product leaf's ancestor path (outermost category first, the leaf
//!   itself excluded), unioned across branches when a product is placed in
//!   several categories
//! - the id -> name table for category nodes
//! - the category-only tree
//!
//! The walk uses an explicit stack, so catalog depth is not limited by the
//! call stack.

use std::collections::HashMap;

use shared::models::{CatalogNode, CategoryBranch};

/// Output of [`flatten`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedCatalog {
    /// Distinct leaf ids in first-discovery order
    leaf_order: Vec<String>,
    ancestor_paths: HashMap<String, Vec<String>>,
    category_names: HashMap<String, String>,
    category_tree: Vec<CategoryBranch>,
}

impl FlattenedCatalog {
    pub fn leaf_ids(&self) -> &[String] {
        &self.leaf_order
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_order.len()
    }

    pub fn ancestor_path(&self, leaf_id: &str) -> Option<&[String]> {
        self.ancestor_paths.get(leaf_id).map(Vec::as_slice)
    }

    pub fn ancestor_paths(&self) -> &HashMap<String, Vec<String>> {
        &self.ancestor_paths
    }

    pub fn category_names(&self) -> &HashMap<String, String> {
        &self.category_names
    }

    pub fn category_tree(&self) -> &[CategoryBranch] {
        &self.category_tree
    }

    /// Split into (ancestor paths, category names, category-only tree)
    pub fn into_parts(
        self,
    ) -> (
        HashMap<String, Vec<String>>,
        HashMap<String, String>,
        Vec<CategoryBranch>,
    ) {
        (self.ancestor_paths, self.category_names, self.category_tree)
    }

    fn record_leaf(&mut self, id: &str, path: &[&str]) {
        match self.ancestor_paths.get_mut(id) {
            Some(existing) => {
                for ancestor in path {
                    if !existing.iter().any(|known| known == ancestor) {
                        existing.push((*ancestor).to_string());
                    }
                }
            }
            None => {
                self.leaf_order.push(id.to_string());
                self.ancestor_paths
                    .insert(id.to_string(), path.iter().map(|a| a.to_string()).collect());
            }
        }
    }
}

/// Flatten a tagged category tree
pub fn flatten(root: &CatalogNode) -> FlattenedCatalog {
    enum Frame<'a> {
        Enter(&'a CatalogNode),
        Exit,
    }

    let mut out = FlattenedCatalog::default();
    let mut pending = vec![Frame::Enter(root)];
    let mut path: Vec<&str> = Vec::new();
    // Category branches still collecting children, innermost last
    let mut open: Vec<CategoryBranch> = Vec::new();

    while let Some(frame) = pending.pop() {
        match frame {
            Frame::Enter(CatalogNode::Product { id, .. }) => {
                out.record_leaf(id, &path);
            }
            Frame::Enter(CatalogNode::Category { id, name, children }) => {
                // First name seen wins when a category id recurs in another branch
                out.category_names
                    .entry(id.clone())
                    .or_insert_with(|| name.clone());
                open.push(CategoryBranch::new(id.as_str(), name.as_str()));
                path.push(id);
                pending.push(Frame::Exit);
                pending.extend(children.iter().rev().map(Frame::Enter));
            }
            Frame::Exit => {
                path.pop();
                if let Some(branch) = open.pop() {
                    match open.last_mut() {
                        Some(parent) => parent.children.push(branch),
                        None => out.category_tree.push(branch),
                    }
                }
            }
        }
    }

    tracing::debug!(
        leaves = out.leaf_order.len(),
        categories = out.category_names.len(),
        "Flattened category tree"
    );
    out
}
