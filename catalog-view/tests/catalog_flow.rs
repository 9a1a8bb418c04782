//! End-to-end load and query flows against in-memory sources

use std::sync::Arc;
use std::time::Duration;

use catalog_view::{
    CatalogError, CatalogStore, FetchConfig, InMemoryProductSource, StaticTreeSource, StoreOptions,
    TreeVariant, flatten,
};
use shared::models::{
    CatalogNode, CategoryNode, FilterCriteria, IdConvention, Product, SortCriteria, SortKey,
};

fn example_tree() -> CategoryNode {
    CategoryNode::new("s0", "Catalog").with_children(vec![
        CategoryNode::new("s1", "Wine").with_children(vec![
            CategoryNode::new("p1", "Rioja"),
            CategoryNode::new("p2", "Albariño"),
        ]),
        CategoryNode::new("s2", "Offers").with_children(vec![CategoryNode::new("p1", "Rioja")]),
    ])
}

fn example_products() -> InMemoryProductSource {
    InMemoryProductSource::with_products([
        Product::new("p1", "Rioja").with_metrics(10.0, 5.0, 3.0),
        Product::new("p2", "Albariño").with_metrics(20.0, 1.0, 0.0),
    ])
}

/// `groups` categories with `per_group` products each; every third product
/// id also appears in the next group
fn wide_tree(groups: usize, per_group: usize) -> CategoryNode {
    let children = (0..groups)
        .map(|g| {
            let mut leaves: Vec<CategoryNode> = (0..per_group)
                .map(|i| {
                    let id = format!("p{}", g * per_group + i);
                    CategoryNode::new(id.clone(), id)
                })
                .collect();
            if g > 0 {
                leaves.extend((0..per_group).step_by(3).map(|i| {
                    let id = format!("p{}", (g - 1) * per_group + i);
                    CategoryNode::new(id.clone(), id)
                }));
            }
            CategoryNode::new(format!("s{g}"), format!("Group {g}")).with_children(leaves)
        })
        .collect();
    CategoryNode::new("sroot", "Root").with_children(children)
}

fn wide_products(count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| Product::new(format!("p{i}"), format!("Product {i}")).with_metrics(i as f64, 1.0, (i % 2) as f64))
        .collect()
}

fn options(batch_size: usize) -> StoreOptions {
    StoreOptions {
        fetch: FetchConfig::default().with_batch_size(batch_size).with_retries(1, 1),
        ..Default::default()
    }
}

fn ids(rows: &[catalog_view::CatalogRow]) -> Vec<&str> {
    rows.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn test_worked_example_end_to_end() {
    let store = CatalogStore::new(options(4));
    let report = store
        .load(&StaticTreeSource::new(example_tree()), &example_products())
        .await
        .unwrap();
    assert_eq!(report.entries, 2);

    let snapshot = store.snapshot().unwrap();
    let p1 = snapshot.index.get("p1").unwrap();
    assert!(p1.in_category("s1") && p1.in_category("s2"));

    let in_stock = store
        .query(&FilterCriteria::new().in_stock_only(true), SortCriteria::default())
        .unwrap();
    assert_eq!(ids(&in_stock), vec!["p1"]);

    let by_price = store
        .query(&FilterCriteria::new(), SortCriteria::ascending(SortKey::Price))
        .unwrap();
    assert_eq!(ids(&by_price), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_entry_count_matches_distinct_leaves() {
    let tree = wide_tree(6, 7);
    let root = CatalogNode::ingest(&tree, &IdConvention::default()).unwrap();
    let distinct = flatten(&root).leaf_count();
    assert_eq!(distinct, 42);

    let source = InMemoryProductSource::with_products(wide_products(42))
        .with_delay(Duration::from_millis(2));
    let store = CatalogStore::new(options(5));
    let report = store.load(&StaticTreeSource::new(tree), &source).await.unwrap();

    assert_eq!(report.entries, distinct);
    assert_eq!(source.calls(), distinct);
    // p0 sits in group 0 and again in group 1
    let p0 = store.snapshot().unwrap().index.get("p0").cloned().unwrap();
    assert_eq!(p0.categories, vec!["sroot", "s0", "s1"]);
}

#[tokio::test]
async fn test_in_flight_requests_bounded_by_batch_width() {
    let source = InMemoryProductSource::with_products(wide_products(40))
        .with_delay(Duration::from_millis(5));
    let store = CatalogStore::new(options(8));
    store
        .load(&StaticTreeSource::new(wide_tree(4, 10)), &source)
        .await
        .unwrap();

    assert!(source.max_in_flight() <= 8);
    assert!(source.max_in_flight() > 1);
}

#[tokio::test]
async fn test_completion_order_does_not_change_index() {
    let tree = wide_tree(3, 6);

    // Earlier ids finish last in the first run, first in the second
    let mut slow_first = InMemoryProductSource::with_products(wide_products(18));
    let mut slow_last = InMemoryProductSource::with_products(wide_products(18));
    for i in 0..18u64 {
        slow_first = slow_first.with_delay_for(format!("p{i}"), Duration::from_millis(18 - i));
        slow_last = slow_last.with_delay_for(format!("p{i}"), Duration::from_millis(i + 1));
    }

    let first = CatalogStore::new(options(6));
    first.load(&StaticTreeSource::new(tree.clone()), &slow_first).await.unwrap();
    let second = CatalogStore::new(options(6));
    second.load(&StaticTreeSource::new(tree), &slow_last).await.unwrap();

    let all = FilterCriteria::new();
    let sort = SortCriteria::ascending(SortKey::Id);
    assert_eq!(first.query(&all, sort).unwrap(), second.query(&all, sort).unwrap());

    let a = first.snapshot().unwrap();
    let b = second.snapshot().unwrap();
    assert_eq!(a.index.all(), b.index.all());
}

#[tokio::test]
async fn test_newer_load_supersedes_slow_one() {
    let store = CatalogStore::new(options(4));
    let slow = Arc::new(example_products().with_delay(Duration::from_millis(200)));
    let trees = Arc::new(StaticTreeSource::new(example_tree()));

    let stale_ticket = store.begin_load();
    let stale = {
        let store = store.clone();
        let slow = slow.clone();
        let trees = trees.clone();
        tokio::spawn(async move {
            store
                .run_load(&stale_ticket, trees.as_ref(), slow.as_ref(), TreeVariant::Standard)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let fresh = store.load(trees.as_ref(), &example_products()).await.unwrap();
    assert_eq!(fresh.generation, 2);

    let err = stale.await.unwrap().unwrap_err();
    assert!(matches!(err, CatalogError::Superseded { generation: 1, current: 2 }));
    assert_eq!(store.snapshot().unwrap().generation, 2);
}

#[tokio::test]
async fn test_cancelled_load_publishes_nothing() {
    let store = CatalogStore::new(options(4));
    let slow = Arc::new(example_products().with_delay(Duration::from_secs(30)));
    let trees = Arc::new(StaticTreeSource::new(example_tree()));

    let ticket = store.begin_load();
    let handle = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .run_load(&ticket, trees.as_ref(), slow.as_ref(), TreeVariant::Standard)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    store.cancel_current();

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, CatalogError::Cancelled));
    assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
    let store = CatalogStore::new(options(4));
    store
        .load(&StaticTreeSource::new(example_tree()), &example_products())
        .await
        .unwrap();

    let cyclic = CategoryNode::new("s0", "Catalog")
        .with_children(vec![CategoryNode::new("s1", "Wine").with_children(vec![CategoryNode::new("s0", "Again")])]);
    let err = store
        .load(&StaticTreeSource::new(cyclic), &example_products())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::MalformedTree(_)));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.index.len(), 2);
    assert_eq!(store.current_generation(), 2);
}

#[tokio::test]
async fn test_large_tree_variant() {
    let large = wide_tree(2, 3);
    let trees = StaticTreeSource::new(example_tree()).with_large(large);
    let store = CatalogStore::new(StoreOptions {
        variant: TreeVariant::Large,
        ..options(4)
    });

    let report = store
        .load(&trees, &InMemoryProductSource::with_products(wide_products(6)))
        .await
        .unwrap();
    assert_eq!(report.entries, 6);
    assert!(report.not_found.is_empty());
}

#[tokio::test]
async fn test_soft_misses_are_queryable_placeholders() {
    let products = example_products();
    products.remove("p2");
    let store = CatalogStore::new(options(4));
    let report = store
        .load(&StaticTreeSource::new(example_tree()), &products)
        .await
        .unwrap();
    assert_eq!(report.not_found, vec!["p2".to_string()]);

    let rows = store
        .query(&FilterCriteria::new().price_between(None, Some(0.0)), SortCriteria::default())
        .unwrap();
    assert_eq!(ids(&rows), vec!["p2"]);
    assert_eq!(rows[0].name, "");
    assert_eq!(rows[0].category_path, "Catalog > Wine");
}

#[tokio::test]
async fn test_very_deep_tree_loads() {
    let depth = 100_000;
    let mut tree = CategoryNode::new("p-deep", "Deep");
    for level in 0..depth {
        tree = CategoryNode::new(format!("s{level}"), format!("Level {level}")).with_children(vec![tree]);
    }
    let products = InMemoryProductSource::with_products([
        Product::new("p-deep", "Deep").with_metrics(1.0, 1.0, 1.0),
    ]);

    let store = CatalogStore::new(options(4));
    let report = store.load(&StaticTreeSource::new(tree), &products).await.unwrap();
    assert_eq!(report.entries, 1);

    let rows = store
        .query(&FilterCriteria::new().in_categories(["s0"]), SortCriteria::default())
        .unwrap();
    assert_eq!(ids(&rows), vec!["p-deep"]);
    assert!(rows[0].category_path.starts_with(&format!("Level {}", depth - 1)));

    let categories = store.category_tree().unwrap();
    assert_eq!(categories[0].id, format!("s{}", depth - 1));

    // Replacing the snapshot drops the old deep one
    store
        .load(&StaticTreeSource::new(example_tree()), &example_products())
        .await
        .unwrap();
    assert_eq!(store.snapshot().unwrap().generation, 2);
}
