//! Batched product fetcher
//!
//! Leaf ids are fetched in fixed-width batches. Every request in a batch is
//! issued at once and the whole batch is awaited before the next one starts,
//! so at most `batch_size` lookups are outstanding against the source.
//!
//! Results are merged by id, never by arrival position, so the index does
//! not depend on completion order inside a batch.

use futures::future::join_all;
use shared::error::{ErrorBody, ErrorCode};
use shared::models::Product;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::FetchConfig;
use crate::error::{CatalogError, CatalogResult, SourceError};
use crate::flatten::FlattenedCatalog;
use crate::index::CatalogIndex;
use crate::source::ProductSource;

/// An id whose lookup kept failing after all retries
#[derive(Debug, Error)]
#[error("fetch of {id} failed after {attempts} attempts: {error}")]
pub struct FetchFailure {
    pub id: String,
    pub attempts: u32,
    #[source]
    pub error: SourceError,
}

impl FetchFailure {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::FetchFailed
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::with_message(self.code(), self.to_string())
    }
}

/// Result of one full fetch
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Found products plus placeholders for soft misses
    pub index: CatalogIndex,
    /// Ids the source had no record for
    pub not_found: Vec<String>,
    /// Ids left out of the index because their lookup failed
    pub failures: Vec<FetchFailure>,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchFetcher {
    config: FetchConfig,
}

impl BatchFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every leaf of `catalog` from `source`
    ///
    /// Returns [`CatalogError::Cancelled`] as soon as `cancel` fires; results
    /// of the batch in flight at that point are dropped.
    pub async fn fetch<S>(
        &self,
        catalog: &FlattenedCatalog,
        source: &S,
        cancel: &CancellationToken,
    ) -> CatalogResult<FetchOutcome>
    where
        S: ProductSource + ?Sized,
    {
        let batch_size = self.config.batch_size.max(1);
        let leaf_ids = catalog.leaf_ids();
        let mut outcome = FetchOutcome {
            index: CatalogIndex::with_capacity(leaf_ids.len()),
            ..Default::default()
        };

        for (batch_no, batch) in leaf_ids.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(batch = batch_no, "Fetch cancelled before batch");
                return Err(CatalogError::Cancelled);
            }

            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(batch = batch_no, "Fetch cancelled mid-batch");
                    return Err(CatalogError::Cancelled);
                }
                results = join_all(batch.iter().map(|id| self.fetch_one(source, id))) => results,
            };

            for (id, result) in batch.iter().zip(results) {
                let categories = catalog.ancestor_path(id).unwrap_or_default();
                match result {
                    Ok(Some(product)) => {
                        outcome.index.upsert(id, product, categories);
                    }
                    Ok(None) => {
                        tracing::warn!(product_id = %id, "Product not found, using placeholder");
                        outcome.index.upsert(id, Product::placeholder(id.as_str()), categories);
                        outcome.not_found.push(id.clone());
                    }
                    Err(failure) => {
                        tracing::warn!(
                            product_id = %failure.id,
                            attempts = failure.attempts,
                            error = %failure.error,
                            "Product fetch failed"
                        );
                        outcome.failures.push(failure);
                    }
                }
            }

            tracing::debug!(
                batch = batch_no,
                size = batch.len(),
                indexed = outcome.index.len(),
                "Batch merged"
            );
        }

        Ok(outcome)
    }

    /// One id, retried with backoff while the source errors
    async fn fetch_one<S>(&self, source: &S, id: &str) -> Result<Option<Product>, FetchFailure>
    where
        S: ProductSource + ?Sized,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match source.get_product(id).await {
                Ok(found) => return Ok(found),
                Err(error) if attempt > self.config.max_retries => {
                    return Err(FetchFailure {
                        id: id.to_string(),
                        attempts: attempt,
                        error,
                    });
                }
                Err(error) => {
                    let delay = self.config.retry_delay(attempt);
                    tracing::debug!(
                        product_id = %id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying product fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
