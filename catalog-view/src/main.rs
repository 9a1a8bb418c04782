//! Load the catalog from the configured HTTP source and print one query as JSON
//!
//! Usage: `catalog-view [sort-key] [asc|desc] [name-filter]`

use anyhow::Context;
use catalog_view::logging::init_from_config;
use catalog_view::{CatalogConfig, CatalogStore, HttpCatalogSource};
use shared::models::{FilterCriteria, SortCriteria};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CatalogConfig::load();
    let _log_guard = init_from_config(&config);

    let mut args = std::env::args().skip(1);
    let key = args.next().unwrap_or_else(|| "id".to_string());
    let order = args.next().unwrap_or_else(|| "asc".to_string());
    let sort = SortCriteria::parse(&key, &order)?;
    let filter = match args.next() {
        Some(name) => FilterCriteria::new().name_contains(name),
        None => FilterCriteria::new(),
    };

    tracing::info!(source = %config.source_url, "Catalog view starting");

    let source = HttpCatalogSource::from_config(&config)
        .with_context(|| format!("Failed to create source for {}", config.source_url))?;
    let store = CatalogStore::from_config(&config);

    let report = store.load(&source, &source).await?;
    if report.is_partial() {
        tracing::warn!(failed = report.failures.len(), "Some products could not be fetched");
        for body in report.failure_bodies() {
            tracing::warn!(code = %body.code, "{}", body.message);
        }
    }

    let rows = store.query(&filter, sort)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
