//! The ordered read the presentation layer consumes, and a consistency audit over it.

use crate::catalog::model::Category;
use crate::catalog::store::CatalogStore;
use crate::catalog::CatalogError;
use serde::Serialize;
use std::collections::BTreeMap;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Active categories by ascending order value, ties broken by id.
///
/// The order value is compared as stored: a never-curated `0` sorts before
/// every curated row and a null sorts after all of them. Backfill removes both.
pub fn list_active_categories<S>(store: &S) -> Result<Vec<Category>, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span("list_active_categories", store.table()).entered();

    store
        .list_active()
        .map_err(|e| CatalogError::store("list active categories", e))
}

/// Several active categories sharing one order value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCollision {
    pub order: i32,
    pub slugs: Vec<String>,
}

/// How far the active listing is from the steady state `1..=N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderingAudit {
    pub total: usize,
    /// Slugs whose order is still 0 or null.
    pub unset: Vec<String>,
    pub collisions: Vec<OrderCollision>,
    /// Orders are exactly 1..=total.
    pub contiguous: bool,
}

impl OrderingAudit {
    pub fn is_clean(&self) -> bool {
        self.unset.is_empty() && self.collisions.is_empty() && self.contiguous
    }

    /// Audit an already-fetched listing.
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut unset = Vec::new();
        let mut by_order: BTreeMap<i32, Vec<String>> = BTreeMap::new();

        for category in categories {
            match category.order {
                Some(order) if !category.has_unset_order() => {
                    by_order.entry(order).or_default().push(category.slug.clone())
                }
                _ => unset.push(category.slug.clone()),
            }
        }

        let contiguous = unset.is_empty()
            && by_order.len() == categories.len()
            && by_order.keys().copied().eq(1..=categories.len() as i32);

        let collisions = by_order
            .into_iter()
            .filter(|(_, slugs)| slugs.len() > 1)
            .map(|(order, slugs)| OrderCollision { order, slugs })
            .collect();

        Self {
            total: categories.len(),
            unset,
            collisions,
            contiguous,
        }
    }
}

/// Read the active listing and report sentinels, collisions and gaps.
pub fn audit_ordering<S>(store: &S) -> Result<OrderingAudit, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    let categories = list_active_categories(store)?;
    let audit = OrderingAudit::from_categories(&categories);
    if audit.is_clean() {
        log::info!("{} active categories ordered 1..={}", audit.total, audit.total);
    } else {
        log::warn!(
            "ordering audit: {} unset, {} collision(s), contiguous: {}",
            audit.unset.len(),
            audit.collisions.len(),
            audit.contiguous
        );
    }
    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{category, MemoryCatalogStore};

    #[test]
    fn test_listing_excludes_inactive_and_sorts() {
        let mut closed = category(4, "closed", Some(1));
        closed.active = false;
        let store = MemoryCatalogStore::from_rows(vec![
            category(1, "c", Some(3)),
            category(2, "unset", None),
            category(3, "a", Some(1)),
            category(5, "b", Some(3)),
            closed,
        ]);

        let listing = list_active_categories(&store).unwrap();
        let slugs: Vec<_> = listing.iter().map(|c| c.slug.as_str()).collect();

        assert_eq!(slugs, vec!["a", "c", "b", "unset"]);
    }

    #[test]
    fn test_audit_clean_catalog() {
        let store = MemoryCatalogStore::with_orders(&[("a", 1), ("b", 2), ("c", 3)]);

        let audit = audit_ordering(&store).unwrap();

        assert!(audit.is_clean());
        assert_eq!(audit.total, 3);
    }

    #[test]
    fn test_audit_reports_sentinels_collisions_and_gaps() {
        let audit = OrderingAudit::from_categories(&[
            category(1, "a", Some(1)),
            category(2, "b", Some(1)),
            category(3, "c", Some(0)),
            category(4, "d", Some(7)),
        ]);

        assert_eq!(audit.unset, vec!["c".to_string()]);
        assert_eq!(
            audit.collisions,
            vec![OrderCollision {
                order: 1,
                slugs: vec!["a".to_string(), "b".to_string()]
            }]
        );
        assert!(!audit.contiguous);
        assert!(!audit.is_clean());
    }

    #[test]
    fn test_audit_gap_is_not_contiguous() {
        let audit = OrderingAudit::from_categories(&[
            category(1, "a", Some(1)),
            category(2, "b", Some(3)),
        ]);

        assert!(audit.collisions.is_empty());
        assert!(audit.unset.is_empty());
        assert!(!audit.contiguous);
    }

    #[test]
    fn test_listing_failure_is_store_error() {
        let store = MemoryCatalogStore::with_orders(&[("a", 1)]);
        store.fail_reads();

        assert!(matches!(
            list_active_categories(&store),
            Err(CatalogError::StoreWrite { .. })
        ));
    }

    #[test]
    fn test_listing_sorts_zero_first_and_null_last() {
        let store = MemoryCatalogStore::from_rows(vec![
            category(1, "curated", Some(1)),
            category(2, "untouched", None),
            category(3, "fresh", Some(0)),
        ]);

        let slugs: Vec<String> = list_active_categories(&store)
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();

        assert_eq!(slugs, vec!["fresh", "curated", "untouched"]);
    }
}
