//! Schema evolution and backfill of the display-order column.

use crate::catalog::model::CategoryOrder;
use crate::catalog::store::{CatalogStore, ORDER_COLUMN};
use crate::catalog::CatalogError;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// What [`ensure_order_column`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumnOutcome {
    /// The column was missing and has been added with default 0.
    Added,
    /// The column already existed; nothing was changed.
    AlreadyPresent,
}

/// Make sure the catalog table carries an integer `order` column (default 0).
///
/// Safe to run any number of times. Any store failure, including failing to
/// inspect the schema, is a [`CatalogError::SchemaMigration`].
pub fn ensure_order_column<S>(store: &S) -> Result<OrderColumnOutcome, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span("ensure_order_column", store.table()).entered();

    if store
        .has_column(ORDER_COLUMN)
        .map_err(CatalogError::SchemaMigration)?
    {
        log::info!("{}.\"{}\" already present", store.table(), ORDER_COLUMN);
        return Ok(OrderColumnOutcome::AlreadyPresent);
    }

    store
        .add_order_column()
        .map_err(CatalogError::SchemaMigration)?;
    log::info!("added {}.\"{}\" (integer, default 0)", store.table(), ORDER_COLUMN);
    Ok(OrderColumnOutcome::Added)
}

/// Give every row without a curated order `order := id`.
///
/// Ids grow with creation time, so the result is the creation order the
/// catalog implicitly had. Rows that already carry a non-zero order are left
/// alone, which makes a second run touch nothing.
///
/// Requires [`ensure_order_column`] to have run.
pub fn backfill_missing_order<S>(store: &S) -> Result<Vec<CategoryOrder>, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span("backfill_missing_order", store.table()).entered();

    let written = store
        .backfill_unset_order()
        .map_err(|e| CatalogError::store("backfill missing order", e))?;

    for record in &written {
        log::info!("backfilled {}", record);
    }
    log::info!("backfill touched {} row(s) in {}", written.len(), store.table());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{category, MemoryCatalogStore};
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    #[test]
    fn test_ensure_adds_column_with_default() {
        let store = MemoryCatalogStore::without_order_column(&["restaurants", "shopping"]);

        let outcome = ensure_order_column(&store).unwrap();

        assert_eq!(outcome, OrderColumnOutcome::Added);
        assert!(store.has_order_column());
        assert_eq!(store.order_of("restaurants"), Some(0));
        assert_eq!(store.order_of("shopping"), Some(0));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let store = MemoryCatalogStore::without_order_column(&["restaurants"]);

        ensure_order_column(&store).unwrap();
        let after_first = store.rows();
        let second = ensure_order_column(&store).unwrap();

        assert_eq!(second, OrderColumnOutcome::AlreadyPresent);
        assert_eq!(store.rows(), after_first);
        assert_eq!(store.alter_count(), 1);
    }

    #[test]
    fn test_ensure_failure_is_schema_migration_error() {
        let store = MemoryCatalogStore::without_order_column(&["restaurants"]);
        store.fail_schema_changes();

        let err = ensure_order_column(&store).unwrap_err();

        assert!(matches!(err, CatalogError::SchemaMigration(_)));
        assert!(!store.has_order_column());
    }

    #[test]
    fn test_backfill_uses_id_for_unset_rows_only() {
        let store = MemoryCatalogStore::from_rows(vec![
            category(1, "restaurants", Some(0)),
            category(2, "shopping", Some(0)),
            category(3, "services", Some(5)),
        ]);

        let written = backfill_missing_order(&store).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(store.order_of("restaurants"), Some(1));
        assert_eq!(store.order_of("shopping"), Some(2));
        assert_eq!(store.order_of("services"), Some(5));
    }

    #[test]
    fn test_backfill_treats_null_as_unset() {
        let store = MemoryCatalogStore::from_rows(vec![
            category(4, "nightlife", None),
            category(9, "pets", Some(2)),
        ]);

        backfill_missing_order(&store).unwrap();

        assert_eq!(store.order_of("nightlife"), Some(4));
        assert_eq!(store.order_of("pets"), Some(2));
    }

    #[test]
    fn test_backfill_is_idempotent_over_random_catalogs() {
        for _ in 0..20 {
            let rows: Vec<_> = (1..=(2..12).fake::<i32>())
                .map(|id| {
                    let word: String = Word().fake();
                    let order = if (0..3).fake::<u8>() == 0 {
                        None
                    } else {
                        Some((0..4).fake::<i32>())
                    };
                    category(id, &format!("{}-{}", word.to_lowercase(), id), order)
                })
                .collect();
            let store = MemoryCatalogStore::from_rows(rows);

            backfill_missing_order(&store).unwrap();
            let once = store.rows();
            let second = backfill_missing_order(&store).unwrap();

            assert!(second.is_empty());
            assert_eq!(store.rows(), once);
            assert!(once.iter().all(|c| !c.has_unset_order()));
        }
    }

    #[test]
    fn test_backfill_failure_is_fatal_store_error() {
        let store = MemoryCatalogStore::from_rows(vec![category(1, "restaurants", Some(0))]);
        store.fail_all_writes();

        let err = backfill_missing_order(&store).unwrap_err();

        assert!(matches!(err, CatalogError::StoreWrite { slug: None, .. }));
        assert_eq!(store.order_of("restaurants"), Some(0));
    }
}
