//! Filter/sort pipeline
//!
//! `evaluate` is a pure pull over an index: validate the criteria, keep the
//! entries every active predicate accepts, then stable-sort them. It never
//! mutates the index, so calling it repeatedly with the same inputs gives
//! the same output.
//!
//! Id and name filters match substrings case-insensitively. Descending order
//! negates the comparator instead of reversing the output, so entries with
//! equal keys keep their index order in both directions.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use shared::models::{FilterCriteria, SortCriteria, SortKey, SortOrder};

use crate::error::CatalogResult;
use crate::index::{CatalogEntry, CatalogIndex};
use crate::names::CategoryNameCache;

/// Filter and sort `index` according to the given criteria
pub fn evaluate<'a>(
    index: &'a CatalogIndex,
    names: &CategoryNameCache,
    filter: &FilterCriteria,
    sort: SortCriteria,
) -> CatalogResult<Vec<&'a CatalogEntry>> {
    filter.validate()?;

    let predicate = Predicate::new(filter);
    let mut entries: Vec<&CatalogEntry> = index.iter().filter(|e| predicate.matches(e)).collect();
    sort_entries(&mut entries, names, sort);

    tracing::trace!(
        total = index.len(),
        matched = entries.len(),
        key = %sort.key,
        "Evaluated catalog query"
    );
    Ok(entries)
}

/// Stable sort by one key
pub fn sort_entries(entries: &mut Vec<&CatalogEntry>, names: &CategoryNameCache, sort: SortCriteria) {
    let directed = |ordering: Ordering| match sort.order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    };

    if sort.key == SortKey::Categories {
        // Compose each path once instead of per comparison
        let mut keyed: Vec<(Arc<str>, &CatalogEntry)> = entries
            .drain(..)
            .map(|entry| (names.compose_path(&entry.categories), entry))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| directed(a.cmp(b)));
        entries.extend(keyed.into_iter().map(|(_, entry)| entry));
        return;
    }

    entries.sort_by(|a, b| directed(compare(a, b, sort.key)));
}

fn compare(a: &CatalogEntry, b: &CatalogEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => a.product.name.cmp(&b.product.name),
        SortKey::Price => a.product.price().total_cmp(&b.product.price()),
        SortKey::Volume => a.product.volume().total_cmp(&b.product.volume()),
        SortKey::Stock => a.product.stock().total_cmp(&b.product.stock()),
        // Handled by sort_entries with precomputed paths
        SortKey::Categories => Ordering::Equal,
    }
}

struct Predicate<'f> {
    filter: &'f FilterCriteria,
    id_needle: String,
    name_needle: String,
}

impl<'f> Predicate<'f> {
    fn new(filter: &'f FilterCriteria) -> Self {
        Self {
            filter,
            id_needle: filter.id_substring.to_lowercase(),
            name_needle: filter.name_substring.to_lowercase(),
        }
    }

    fn matches(&self, entry: &CatalogEntry) -> bool {
        let product = &entry.product;
        let f = self.filter;

        contains_folded(&entry.id, &self.id_needle)
            && contains_folded(&product.name, &self.name_needle)
            && within(product.price(), f.min_price, f.max_price)
            && within(product.volume(), f.min_volume, f.max_volume)
            && (!f.in_stock_only || product.in_stock())
            && (f.selected_categories.is_empty()
                || entry
                    .categories
                    .iter()
                    .any(|c| f.selected_categories.contains(c)))
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// Inclusive range check; an absent bound does not constrain
fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

/// Display projection of a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub volume: f64,
    pub stock: f64,
    pub in_stock: bool,
    /// Category names, outermost first, joined with `" > "`
    pub category_path: String,
}

impl CatalogRow {
    pub fn from_entry(entry: &CatalogEntry, names: &CategoryNameCache) -> Self {
        let product = &entry.product;
        Self {
            id: entry.id.clone(),
            name: product.name.clone(),
            price: product.price(),
            volume: product.volume(),
            stock: product.stock(),
            in_stock: product.in_stock(),
            category_path: names.compose_path(&entry.categories).to_string(),
        }
    }
}

pub fn project_rows(entries: &[&CatalogEntry], names: &CategoryNameCache) -> Vec<CatalogRow> {
    entries
        .iter()
        .map(|entry| CatalogRow::from_entry(entry, names))
        .collect()
}
