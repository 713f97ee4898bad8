//! Integration tests for the PostgreSQL catalog store
//!
//! These run against a real PostgreSQL database and are skipped unless
//! `BIZDIR_TEST_DATABASE_URL` is set. Each test works on its own scratch
//! table, dropped when the test ends.

use bizdir::catalog::{
    apply_explicit_order, audit_ordering, backfill_missing_order, ensure_order_column,
    list_active_categories, rename_and_retag, CatalogTable, CategoryMatch, OrderColumnOutcome,
    ReorderOptions, Retag, RetagOutcome,
};
use bizdir::{connect, CatalogError, Executor, PgCatalogStore, PgExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};

const TEST_DATABASE_URL: &str = "BIZDIR_TEST_DATABASE_URL";

static TABLE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A scratch `categories`-shaped table without the `order` column.
struct ScratchCatalog {
    store: PgCatalogStore<PgExecutor>,
    table: String,
}

impl ScratchCatalog {
    fn create() -> Option<Self> {
        let url = match std::env::var(TEST_DATABASE_URL) {
            Ok(url) => url,
            Err(_) => {
                eprintln!("{} not set; skipping", TEST_DATABASE_URL);
                return None;
            }
        };
        let table = format!(
            "categories_it_{}_{}",
            std::process::id(),
            TABLE_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        let client = connect(&url).expect("Failed to connect to test database");
        let store = PgCatalogStore::new(
            PgExecutor::new(client),
            CatalogTable::parse(&table).expect("scratch table name is valid"),
        );
        store
            .executor()
            .execute(
                &format!(
                    "CREATE TABLE {} (
                        id SERIAL PRIMARY KEY,
                        name TEXT NOT NULL,
                        slug TEXT NOT NULL,
                        active BOOLEAN NOT NULL DEFAULT true,
                        icon TEXT
                    )",
                    table
                ),
                &[],
            )
            .expect("Failed to create scratch table");
        Some(Self { store, table })
    }

    fn insert(&self, name: &str, slug: &str, active: bool) {
        self.store
            .executor()
            .execute(
                &format!(
                    "INSERT INTO {} (name, slug, active) VALUES ($1, $2, $3)",
                    self.table
                ),
                &[&name, &slug, &active],
            )
            .expect("Failed to insert category");
    }

    fn order_of(&self, slug: &str) -> Option<i32> {
        let row = self
            .store
            .executor()
            .query_one(
                &format!(r#"SELECT "order" FROM {} WHERE slug = $1"#, self.table),
                &[&slug],
            )
            .expect("Failed to read order");
        row.get(0)
    }
}

impl Drop for ScratchCatalog {
    fn drop(&mut self) {
        let _ = self
            .store
            .executor()
            .execute(&format!("DROP TABLE IF EXISTS {}", self.table), &[]);
    }
}

macro_rules! scratch {
    () => {
        match ScratchCatalog::create() {
            Some(catalog) => catalog,
            None => return,
        }
    };
}

#[test]
fn test_ensure_order_column_is_idempotent() {
    let catalog = scratch!();
    catalog.insert("Restaurants", "restaurants", true);

    assert_eq!(ensure_order_column(&catalog.store).unwrap(), OrderColumnOutcome::Added);
    assert_eq!(catalog.order_of("restaurants"), Some(0));
    assert_eq!(
        ensure_order_column(&catalog.store).unwrap(),
        OrderColumnOutcome::AlreadyPresent
    );
}

#[test]
fn test_migrate_then_curate() {
    let catalog = scratch!();
    catalog.insert("Auto", "auto", true);
    catalog.insert("Pets", "pets", true);
    catalog.insert("Shopping", "shopping", true);
    catalog.insert("Archived", "archived", false);

    ensure_order_column(&catalog.store).unwrap();
    let written = backfill_missing_order(&catalog.store).unwrap();
    assert_eq!(written.len(), 4);
    assert!(backfill_missing_order(&catalog.store).unwrap().is_empty());

    let report =
        apply_explicit_order(&catalog.store, &["shopping", "auto", "ghost"], ReorderOptions::default())
            .unwrap();
    assert_eq!(report.applied_count(), 2);
    assert_eq!(report.unmatched_count(), 1);
    assert!(report.is_success());

    let slugs: Vec<String> = list_active_categories(&catalog.store)
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    // pets keeps its backfilled order 2, tied with auto; ties go by id.
    assert_eq!(slugs, vec!["shopping", "auto", "pets"]);
    assert!(!audit_ordering(&catalog.store).unwrap().is_clean());
}

#[test]
fn test_complete_reassignment_yields_clean_audit() {
    let catalog = scratch!();
    for slug in ["a", "b", "c", "d"] {
        catalog.insert(&slug.to_uppercase(), slug, true);
    }
    ensure_order_column(&catalog.store).unwrap();
    backfill_missing_order(&catalog.store).unwrap();

    let options = ReorderOptions {
        complete_reassignment: true,
        atomic: true,
    };
    apply_explicit_order(&catalog.store, &["d", "b"], options).unwrap();

    assert_eq!(catalog.order_of("d"), Some(1));
    assert_eq!(catalog.order_of("b"), Some(2));
    assert_eq!(catalog.order_of("a"), Some(3));
    assert_eq!(catalog.order_of("c"), Some(4));
    assert!(audit_ordering(&catalog.store).unwrap().is_clean());
}

#[test]
fn test_reorder_before_migration_fails_per_slug() {
    let catalog = scratch!();
    catalog.insert("Pets", "pets", true);

    let report =
        apply_explicit_order(&catalog.store, &["pets"], ReorderOptions::default()).unwrap();
    assert_eq!(report.failed_count(), 1);

    let atomic = ReorderOptions {
        complete_reassignment: false,
        atomic: true,
    };
    let err = apply_explicit_order(&catalog.store, &["pets"], atomic).unwrap_err();
    assert!(matches!(err, CatalogError::StoreWrite { .. }));
    assert_eq!(err.slug(), Some("pets"));
}

#[test]
fn test_rename_and_retag() {
    let catalog = scratch!();
    catalog.insert("Auto", "auto", true);
    ensure_order_column(&catalog.store).unwrap();

    let retag = Retag::new("Auto Repair", "auto-repair", "🔧");
    let outcome =
        rename_and_retag(&catalog.store, &CategoryMatch::Slug("auto".into()), &retag).unwrap();
    match outcome {
        RetagOutcome::Updated(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].slug, "auto-repair");
            assert_eq!(rows[0].icon.as_deref(), Some("🔧"));
            assert_eq!(rows[0].background_image, None);
        }
        RetagOutcome::NoMatch => panic!("Expected the category to be retagged"),
    }

    let again =
        rename_and_retag(&catalog.store, &CategoryMatch::Slug("auto".into()), &retag).unwrap();
    assert_eq!(again, RetagOutcome::NoMatch);
}
