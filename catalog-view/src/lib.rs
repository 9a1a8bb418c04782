//! Catalog view
//!
//! In-memory, queryable view over a hierarchically categorized product
//! catalog.
//!
//! ```text
//! category tree ──ingest──> CatalogNode ──flatten──> leaf ids + ancestor paths
//!                                                        │
//!                              ProductSource <──batches──┘
//!                                    │
//!                                    v
//!                              CatalogIndex ──evaluate(filter, sort)──> rows
//! ```
//!
//! # Modules
//!
//! - `flatten`: leaf ancestor paths, category names, category-only tree
//! - `names`: memoized category name and path resolution
//! - `fetcher`: bounded, batched product retrieval with retries
//! - `index`: leaf id -> (product, categories)
//! - `pipeline`: filter and stable sort
//! - `store`: generation-versioned snapshots and the load flow
//! - `source`: tree/product collaborator traits with HTTP and in-memory impls

pub mod config;
pub mod error;
pub mod fetcher;
pub mod flatten;
pub mod index;
pub mod logging;
pub mod names;
pub mod pipeline;
pub mod source;
pub mod store;

pub use config::{CatalogConfig, FetchConfig};
pub use error::{CatalogError, CatalogResult, SourceError};
pub use fetcher::{BatchFetcher, FetchFailure, FetchOutcome};
pub use flatten::{FlattenedCatalog, flatten};
pub use index::{CatalogEntry, CatalogIndex};
pub use names::{CategoryNameCache, PATH_SEPARATOR};
pub use pipeline::{CatalogRow, evaluate, project_rows, sort_entries};
pub use source::{
    CategoryTreeSource, HttpCatalogSource, InMemoryProductSource, ProductSource, StaticTreeSource,
    TreeVariant,
};
pub use store::{CatalogSnapshot, CatalogStore, LoadReport, LoadTicket, StoreOptions};

// Re-export logger functions
pub use logging::{init_from_config, init_logger, init_logger_with_file};
