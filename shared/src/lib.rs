//! Shared types for the catalog view
//!
//! Category trees, product records, filter/sort criteria and the error code
//! catalogue used by the core and by any presentation layer driving it.

pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ErrorBody, ErrorCategory, ErrorCode};
pub use models::{
    CatalogNode, CategoryBranch, CategoryNode, CriteriaError, FilterCriteria, IdConvention,
    MalformedTree, Product, SortCriteria, SortKey, SortOrder,
};
