//! Versioned catalog store
//!
//! Each load gets a generation number. Starting a load cancels the one in
//! flight, and a load may only publish its snapshot while its generation is
//! still the newest. Readers always see one complete snapshot.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared::error::ErrorBody;
use shared::models::{CatalogNode, CategoryBranch, FilterCriteria, IdConvention, SortCriteria};
use tokio_util::sync::CancellationToken;

use crate::config::{CatalogConfig, FetchConfig};
use crate::error::{CatalogError, CatalogResult};
use crate::fetcher::{BatchFetcher, FetchFailure};
use crate::flatten::flatten;
use crate::index::CatalogIndex;
use crate::names::CategoryNameCache;
use crate::pipeline::{CatalogRow, evaluate, project_rows};
use crate::source::{CategoryTreeSource, ProductSource, TreeVariant};

/// Load behavior
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub convention: IdConvention,
    pub fetch: FetchConfig,
    /// Publish loads that had fetch failures
    pub allow_partial: bool,
    pub variant: TreeVariant,
}

impl StoreOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            convention: config.id_convention(),
            fetch: config.fetch,
            allow_partial: config.allow_partial,
            variant: config.tree_variant(),
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            convention: IdConvention::default(),
            fetch: FetchConfig::default(),
            allow_partial: true,
            variant: TreeVariant::Standard,
        }
    }
}

/// Handle for one load
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Everything one load produced, published as a unit
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub index: CatalogIndex,
    pub names: CategoryNameCache,
    pub category_tree: Vec<CategoryBranch>,
    pub not_found: Vec<String>,
    /// Ids left out because their fetch failed
    pub failed: Vec<String>,
}

/// Summary returned by [`CatalogStore::load`]
#[derive(Debug)]
pub struct LoadReport {
    pub generation: u64,
    pub entries: usize,
    pub not_found: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

impl LoadReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// One `FetchFailed` body per id that could not be fetched
    pub fn failure_bodies(&self) -> Vec<ErrorBody> {
        self.failures.iter().map(FetchFailure::to_body).collect()
    }
}

#[derive(Debug, Default)]
struct LoadState {
    generation: u64,
    cancel: CancellationToken,
}

/// Owns the published catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    options: Arc<StoreOptions>,
    state: Arc<Mutex<LoadState>>,
    snapshot: Arc<RwLock<Option<Arc<CatalogSnapshot>>>>,
}

impl CatalogStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options: Arc::new(options),
            ..Default::default()
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(StoreOptions::from_config(config))
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Newest generation handed out, published or not
    pub fn current_generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Start a new generation, cancelling the load in flight
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.state.lock();
        state.cancel.cancel();
        state.generation += 1;
        state.cancel = CancellationToken::new();
        tracing::debug!(generation = state.generation, "Load generation started");
        LoadTicket {
            generation: state.generation,
            cancel: state.cancel.clone(),
        }
    }

    /// Cancel the load in flight without starting another
    pub fn cancel_current(&self) {
        self.state.lock().cancel.cancel();
    }

    /// Publish `snapshot` if `ticket` is still the newest generation
    pub fn commit(&self, ticket: &LoadTicket, mut snapshot: CatalogSnapshot) -> CatalogResult<()> {
        let state = self.state.lock();
        if state.generation != ticket.generation {
            tracing::warn!(
                generation = ticket.generation,
                current = state.generation,
                "Discarding superseded load"
            );
            return Err(CatalogError::Superseded {
                generation: ticket.generation,
                current: state.generation,
            });
        }
        if ticket.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        snapshot.generation = ticket.generation;
        *self.snapshot.write() = Some(Arc::new(snapshot));
        Ok(())
    }

    /// Load with the configured tree variant
    pub async fn load<T, P>(&self, trees: &T, products: &P) -> CatalogResult<LoadReport>
    where
        T: CategoryTreeSource + ?Sized,
        P: ProductSource + ?Sized,
    {
        self.load_variant(trees, products, self.options.variant).await
    }

    pub async fn load_variant<T, P>(
        &self,
        trees: &T,
        products: &P,
        variant: TreeVariant,
    ) -> CatalogResult<LoadReport>
    where
        T: CategoryTreeSource + ?Sized,
        P: ProductSource + ?Sized,
    {
        let ticket = self.begin_load();
        self.run_load(&ticket, trees, products, variant).await
    }

    /// Run a load under an existing ticket: tree, ingest, flatten, fetch, commit
    pub async fn run_load<T, P>(
        &self,
        ticket: &LoadTicket,
        trees: &T,
        products: &P,
        variant: TreeVariant,
    ) -> CatalogResult<LoadReport>
    where
        T: CategoryTreeSource + ?Sized,
        P: ProductSource + ?Sized,
    {
        tracing::info!(generation = ticket.generation, ?variant, "Catalog load started");

        let result = self.load_inner(ticket, trees, products, variant).await;
        match result {
            Err(CatalogError::Cancelled) => {
                let current = self.current_generation();
                if current != ticket.generation {
                    tracing::info!(generation = ticket.generation, current, "Catalog load superseded");
                    Err(CatalogError::Superseded {
                        generation: ticket.generation,
                        current,
                    })
                } else {
                    tracing::info!(generation = ticket.generation, "Catalog load cancelled");
                    Err(CatalogError::Cancelled)
                }
            }
            Err(e) => {
                tracing::error!(generation = ticket.generation, error = %e, "Catalog load failed");
                Err(e)
            }
            Ok(report) => {
                tracing::info!(
                    generation = report.generation,
                    entries = report.entries,
                    not_found = report.not_found.len(),
                    failed = report.failures.len(),
                    "Catalog load committed"
                );
                Ok(report)
            }
        }
    }

    async fn load_inner<T, P>(
        &self,
        ticket: &LoadTicket,
        trees: &T,
        products: &P,
        variant: TreeVariant,
    ) -> CatalogResult<LoadReport>
    where
        T: CategoryTreeSource + ?Sized,
        P: ProductSource + ?Sized,
    {
        let raw = tokio::select! {
            biased;
            _ = ticket.cancel.cancelled() => return Err(CatalogError::Cancelled),
            tree = trees.get_tree(variant) => tree.map_err(CatalogError::TreeSource)?,
        };

        let root = CatalogNode::ingest(&raw, &self.options.convention)?;
        let flat = flatten(&root);

        let outcome = BatchFetcher::new(self.options.fetch)
            .fetch(&flat, products, &ticket.cancel)
            .await?;

        if outcome.is_partial() {
            if !self.options.allow_partial {
                return Err(CatalogError::PartialLoad {
                    failures: outcome.failures,
                });
            }
            tracing::warn!(
                generation = ticket.generation,
                failed = outcome.failures.len(),
                "Publishing partial catalog"
            );
        }

        let (_, category_names, category_tree) = flat.into_parts();
        let entries = outcome.index.len();
        let snapshot = CatalogSnapshot {
            generation: ticket.generation,
            index: outcome.index,
            names: CategoryNameCache::new(category_names),
            category_tree,
            not_found: outcome.not_found.clone(),
            failed: outcome.failures.iter().map(|f| f.id.clone()).collect(),
        };
        self.commit(ticket, snapshot)?;

        Ok(LoadReport {
            generation: ticket.generation,
            entries,
            not_found: outcome.not_found,
            failures: outcome.failures,
        })
    }

    /// The published snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.read().clone()
    }

    fn require_snapshot(&self) -> CatalogResult<Arc<CatalogSnapshot>> {
        self.snapshot().ok_or(CatalogError::NotLoaded)
    }

    /// Filtered, sorted rows from the published snapshot
    pub fn query(&self, filter: &FilterCriteria, sort: SortCriteria) -> CatalogResult<Vec<CatalogRow>> {
        let snapshot = self.require_snapshot()?;
        let entries = evaluate(&snapshot.index, &snapshot.names, filter, sort)?;
        Ok(project_rows(&entries, &snapshot.names))
    }

    /// Rows for every product under `category_id`, in index order
    pub fn products_in_category(&self, category_id: &str) -> CatalogResult<Vec<CatalogRow>> {
        let snapshot = self.require_snapshot()?;
        let entries = snapshot.index.in_category(category_id);
        Ok(project_rows(&entries, &snapshot.names))
    }

    pub fn category_tree(&self) -> CatalogResult<Vec<CategoryBranch>> {
        Ok(self.require_snapshot()?.category_tree.clone())
    }
}
