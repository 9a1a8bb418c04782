//! Category Tree Model
//!
//! Tree sources deliver [`CategoryNode`]s where the only thing separating a
//! category grouping from a product leaf is an id prefix. [`CatalogNode::ingest`]
//! makes that decision once and produces a tagged tree; nothing downstream
//! inspects id strings again.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Id prefix marking category nodes in source trees
pub const DEFAULT_CATEGORY_MARKER: &str = "s";

/// Non-recursive `Clone` and `Drop` for `{ id, name, children }` trees
///
/// The derived versions recurse once per level and overflow the stack on
/// deep catalogs.
macro_rules! impl_deep_tree {
    ($tree:ident) => {
        impl Clone for $tree {
            fn clone(&self) -> Self {
                enum Frame<'a> {
                    Enter(&'a $tree),
                    Exit(&'a $tree),
                }

                let mut pending = vec![Frame::Enter(self)];
                let mut built: Vec<$tree> = Vec::new();
                while let Some(frame) = pending.pop() {
                    match frame {
                        Frame::Enter(node) => {
                            pending.push(Frame::Exit(node));
                            pending.extend(node.children.iter().rev().map(Frame::Enter));
                        }
                        Frame::Exit(node) => {
                            let children = built.split_off(built.len() - node.children.len());
                            built.push($tree {
                                id: node.id.clone(),
                                name: node.name.clone(),
                                children,
                            });
                        }
                    }
                }
                built.pop().unwrap_or_else(|| $tree {
                    id: self.id.clone(),
                    name: self.name.clone(),
                    children: Vec::new(),
                })
            }
        }

        impl Drop for $tree {
            fn drop(&mut self) {
                let mut pending = std::mem::take(&mut self.children);
                while let Some(mut node) = pending.pop() {
                    pending.append(&mut node.children);
                }
            }
        }
    };
}

/// Category tree node as delivered by a tree source
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<CategoryNode>) -> Self {
        self.children = children;
        self
    }

    /// Decode a JSON tree of any depth
    ///
    /// `serde_json` caps nesting at 128 by default; this lifts the cap and
    /// grows the stack on demand while decoding.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        de.disable_recursion_limit();
        let tree = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(tree)
    }
}

impl_deep_tree!(CategoryNode);

/// Decides which source ids denote category groupings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdConvention {
    category_marker: String,
}

impl IdConvention {
    pub fn new(category_marker: impl Into<String>) -> Self {
        Self {
            category_marker: category_marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.category_marker
    }

    pub fn is_category(&self, id: &str) -> bool {
        id.starts_with(&self.category_marker)
    }
}

impl Default for IdConvention {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_MARKER)
    }
}

/// Shape violations found while ingesting a source tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTree {
    /// A node with an empty or blank id
    #[error("node under '{parent}' has no id")]
    MissingId { parent: String },

    /// A category id that reappears on its own ancestor path
    #[error("category '{id}' appears inside its own subtree")]
    Cycle { id: String },
}

/// Catalog tree node with the category/product distinction made explicit
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogNode {
    Category {
        id: String,
        name: String,
        children: Vec<CatalogNode>,
    },
    Product {
        id: String,
        name: String,
    },
}

impl CatalogNode {
    pub fn category(
        id: impl Into<String>,
        name: impl Into<String>,
        children: Vec<CatalogNode>,
    ) -> Self {
        Self::Category {
            id: id.into(),
            name: name.into(),
            children,
        }
    }

    pub fn product(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Product {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Category { id, .. } | Self::Product { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Category { name, .. } | Self::Product { name, .. } => name,
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Self::Category { .. })
    }

    /// Convert a source tree into a tagged tree
    ///
    /// Walks with an explicit stack, so depth is bounded by memory rather
    /// than the call stack. Product leaves that carry children keep only
    /// themselves; their children are dropped with a warning.
    pub fn ingest(raw: &CategoryNode, convention: &IdConvention) -> Result<Self, MalformedTree> {
        enum Frame<'a> {
            Enter(&'a CategoryNode),
            Exit(&'a CategoryNode),
        }

        let mut pending = vec![Frame::Enter(raw)];
        let mut built: Vec<CatalogNode> = Vec::new();
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();

        while let Some(frame) = pending.pop() {
            match frame {
                Frame::Enter(node) => {
                    let id = node.id.as_str();
                    if id.trim().is_empty() {
                        return Err(MalformedTree::MissingId {
                            parent: path.last().copied().unwrap_or("<root>").to_string(),
                        });
                    }

                    if !convention.is_category(id) {
                        if !node.children.is_empty() {
                            tracing::warn!(
                                product_id = %id,
                                children = node.children.len(),
                                "Product node carries children, dropping them"
                            );
                        }
                        built.push(CatalogNode::product(id, node.name.as_str()));
                        continue;
                    }

                    if !on_path.insert(id) {
                        return Err(MalformedTree::Cycle { id: id.to_string() });
                    }
                    path.push(id);
                    pending.push(Frame::Exit(node));
                    pending.extend(node.children.iter().rev().map(Frame::Enter));
                }
                Frame::Exit(node) => {
                    path.pop();
                    on_path.remove(node.id.as_str());
                    // Every child pushed exactly one node before this exit
                    let children = built.split_off(built.len() - node.children.len());
                    built.push(CatalogNode::category(
                        node.id.as_str(),
                        node.name.as_str(),
                        children,
                    ));
                }
            }
        }

        built.pop().ok_or_else(|| MalformedTree::MissingId {
            parent: "<root>".to_string(),
        })
    }
}

impl Clone for CatalogNode {
    fn clone(&self) -> Self {
        enum Frame<'a> {
            Enter(&'a CatalogNode),
            Exit(&'a str, &'a str, usize),
        }

        let mut pending = vec![Frame::Enter(self)];
        let mut built: Vec<CatalogNode> = Vec::new();
        while let Some(frame) = pending.pop() {
            match frame {
                Frame::Enter(Self::Product { id, name }) => {
                    built.push(Self::product(id.as_str(), name.as_str()));
                }
                Frame::Enter(Self::Category { id, name, children }) => {
                    pending.push(Frame::Exit(id, name, children.len()));
                    pending.extend(children.iter().rev().map(Frame::Enter));
                }
                Frame::Exit(id, name, count) => {
                    let children = built.split_off(built.len() - count);
                    built.push(Self::category(id, name, children));
                }
            }
        }
        built
            .pop()
            .unwrap_or_else(|| Self::product(self.id(), self.name()))
    }
}

impl Drop for CatalogNode {
    fn drop(&mut self) {
        let Self::Category { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Self::Category { children, .. } = &mut node {
                pending.append(children);
            }
        }
    }
}

/// Node of the category-only tree (products pruned)
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBranch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<CategoryBranch>,
}

impl CategoryBranch {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }
}

impl_deep_tree!(CategoryBranch);

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, children: Vec<CategoryNode>) -> CategoryNode {
        CategoryNode::new(id, id.to_uppercase()).with_children(children)
    }

    #[test]
    fn test_id_convention() {
        let convention = IdConvention::default();
        assert!(convention.is_category("s1"));
        assert!(!convention.is_category("p1"));
        assert!(!convention.is_category(""));

        let custom = IdConvention::new("cat-");
        assert!(custom.is_category("cat-drinks"));
        assert!(!custom.is_category("s1"));
    }

    #[test]
    fn test_ingest_tags_nodes() {
        let tree = raw("s0", vec![raw("s1", vec![raw("p1", vec![])]), raw("p2", vec![])]);
        let node = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();

        let expected = CatalogNode::category(
            "s0",
            "S0",
            vec![
                CatalogNode::category("s1", "S1", vec![CatalogNode::product("p1", "P1")]),
                CatalogNode::product("p2", "P2"),
            ],
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn test_ingest_empty_category_stays_category() {
        let node = CatalogNode::ingest(&raw("s9", vec![]), &IdConvention::default()).unwrap();
        assert!(node.is_category());
        assert_eq!(node.id(), "s9");
    }

    #[test]
    fn test_ingest_product_drops_children() {
        let tree = raw("s0", vec![raw("p1", vec![raw("p2", vec![])])]);
        let node = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();
        assert_eq!(
            node,
            CatalogNode::category("s0", "S0", vec![CatalogNode::product("p1", "P1")])
        );
    }

    #[test]
    fn test_ingest_missing_id() {
        let tree = raw("s0", vec![raw("s1", vec![CategoryNode::new("  ", "blank")])]);
        let err = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap_err();
        assert_eq!(
            err,
            MalformedTree::MissingId {
                parent: "s1".to_string()
            }
        );
    }

    #[test]
    fn test_ingest_cycle() {
        let tree = raw("s0", vec![raw("s1", vec![raw("s0", vec![])])]);
        let err = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap_err();
        assert_eq!(err, MalformedTree::Cycle { id: "s0".to_string() });
    }

    #[test]
    fn test_ingest_same_category_in_sibling_branches_is_fine() {
        let tree = raw(
            "s0",
            vec![raw("s1", vec![raw("s3", vec![])]), raw("s2", vec![raw("s3", vec![])])],
        );
        assert!(CatalogNode::ingest(&tree, &IdConvention::default()).is_ok());
    }

    const DEEP: usize = 100_000;

    fn deep_raw(depth: usize) -> CategoryNode {
        let mut tree = raw("p-leaf", vec![]);
        for level in 0..depth {
            tree = raw(&format!("s{level}"), vec![tree]);
        }
        tree
    }

    fn deep_json(depth: usize) -> String {
        let mut json = String::new();
        for level in (0..depth).rev() {
            json.push_str(&format!(r#"{{"id":"s{level}","name":"S","children":["#));
        }
        json.push_str(r#"{"id":"p-leaf","name":"Leaf"}"#);
        for _ in 0..depth {
            json.push_str("]}");
        }
        json
    }

    #[test]
    fn test_ingest_deep_tree() {
        let tree = deep_raw(DEEP);
        let node = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();
        assert_eq!(node.id(), format!("s{}", DEEP - 1));
        // Both trees are dropped here without recursing per level
    }

    #[test]
    fn test_clone_deep_trees() {
        let tree = deep_raw(DEEP);
        let copy = tree.clone();
        assert_eq!(copy.id, tree.id);
        assert_eq!(copy.children[0].id, format!("s{}", DEEP - 2));

        let node = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();
        let node_copy = node.clone();
        assert_eq!(node_copy.id(), node.id());

        let mut branch = CategoryBranch::new("s-leaf", "Leaf");
        for level in 0..DEEP {
            let mut parent = CategoryBranch::new(format!("s{level}"), "S");
            parent.children.push(branch);
            branch = parent;
        }
        let branch_copy = branch.clone();
        assert_eq!(branch_copy.children.len(), 1);
    }

    #[test]
    fn test_clone_keeps_shape() {
        let tree = raw("s0", vec![raw("s1", vec![raw("p1", vec![])]), raw("p2", vec![])]);
        assert_eq!(tree.clone(), tree);

        let node = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();
        assert_eq!(node.clone(), node);
    }

    #[test]
    fn test_from_json_slice_deep() {
        let json = deep_json(DEEP);
        let tree = CategoryNode::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(tree.id, format!("s{}", DEEP - 1));

        // Past serde_json's default nesting cap
        let shallow = deep_json(200);
        assert!(serde_json::from_str::<CategoryNode>(&shallow).is_err());
        assert!(CategoryNode::from_json_slice(shallow.as_bytes()).is_ok());
    }

    #[test]
    fn test_from_json_slice_rejects_trailing_data() {
        let json = r#"{"id":"s1","name":"Wine"} extra"#;
        assert!(CategoryNode::from_json_slice(json.as_bytes()).is_err());
    }

    #[test]
    fn test_deserialize_source_tree() {
        let json = r#"{"id":"s1","name":"Wine","children":[{"id":"p1","name":"Rioja"}]}"#;
        let tree: CategoryNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
    }
}
