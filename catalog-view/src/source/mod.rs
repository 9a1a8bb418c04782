//! Catalog sources
//!
//! The core never talks to a transport directly. It asks a
//! [`CategoryTreeSource`] for the whole tree and a [`ProductSource`] for one
//! product at a time; batching and concurrency are the fetcher's job.

mod http;
mod memory;

pub use http::HttpCatalogSource;
pub use memory::{InMemoryProductSource, StaticTreeSource};

use async_trait::async_trait;
use shared::models::{CategoryNode, Product};

use crate::error::SourceError;

/// Which category tree to request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeVariant {
    #[default]
    Standard,
    /// Tree for bigger catalogs, served separately by some sources
    Large,
}

/// Supplies the category tree in one call
#[async_trait]
pub trait CategoryTreeSource: Send + Sync {
    async fn get_tree(&self, variant: TreeVariant) -> Result<CategoryNode, SourceError>;
}

/// Looks up a single product by id
///
/// `Ok(None)` means the source has no record for the id (a soft miss);
/// `Err` means the lookup itself failed.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, SourceError>;
}
