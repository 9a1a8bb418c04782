//! Data models
//!
//! Shared between the catalog core and whatever presentation layer drives it.

pub mod category;
pub mod criteria;
pub mod product;

// Re-exports
pub use category::*;
pub use criteria::*;
pub use product::*;
