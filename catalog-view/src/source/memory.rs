//! In-memory sources

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{CategoryNode, Product};

use super::{CategoryTreeSource, ProductSource, TreeVariant};
use crate::error::SourceError;

/// Serves fixed trees
#[derive(Debug, Clone)]
pub struct StaticTreeSource {
    standard: CategoryNode,
    large: Option<CategoryNode>,
}

impl StaticTreeSource {
    pub fn new(tree: CategoryNode) -> Self {
        Self {
            standard: tree,
            large: None,
        }
    }

    /// Serve a different tree for [`TreeVariant::Large`]
    pub fn with_large(mut self, tree: CategoryNode) -> Self {
        self.large = Some(tree);
        self
    }
}

#[async_trait]
impl CategoryTreeSource for StaticTreeSource {
    async fn get_tree(&self, variant: TreeVariant) -> Result<CategoryNode, SourceError> {
        let tree = match (variant, &self.large) {
            (TreeVariant::Large, Some(large)) => large,
            _ => &self.standard,
        };
        Ok(tree.clone())
    }
}

/// Failure budget for an id
#[derive(Debug, Clone, Copy)]
enum Failing {
    Always,
    Times(u32),
}

/// Product source backed by a map
///
/// Can inject failures and per-id latency, and records how many lookups were
/// in flight at once.
#[derive(Debug, Default)]
pub struct InMemoryProductSource {
    products: RwLock<HashMap<String, Product>>,
    failing: RwLock<HashMap<String, Failing>>,
    delay: Option<Duration>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryProductSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let source = Self::new();
        for product in products {
            source.insert(product);
        }
        source
    }

    /// Delay every lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay lookups of one id (overrides the global delay)
    pub fn with_delay_for(mut self, id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }

    pub fn remove(&self, id: &str) -> Option<Product> {
        self.products.write().remove(id)
    }

    /// Every lookup of `id` fails
    pub fn fail_always(&self, id: impl Into<String>) {
        self.failing.write().insert(id.into(), Failing::Always);
    }

    /// The next `times` lookups of `id` fail, later ones succeed
    pub fn fail_times(&self, id: impl Into<String>, times: u32) {
        self.failing.write().insert(id.into(), Failing::Times(times));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Lookups currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of lookups observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn should_fail(&self, id: &str) -> bool {
        let mut failing = self.failing.write();
        match failing.get_mut(id) {
            Some(Failing::Always) => true,
            Some(Failing::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Counts one running lookup until dropped, including a lookup whose future
/// is dropped mid-sleep
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductSource for InMemoryProductSource {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);

        if let Some(delay) = self.delays.get(id).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(id) {
            return Err(SourceError::Unavailable(format!("injected failure for {id}")));
        }
        Ok(self.products.read().get(id).cloned())
    }
}
