//! Ordered category catalog.
//!
//! - [`ensure_order_column`] / [`backfill_missing_order`]: schema evolution
//! - [`apply_explicit_order`]: curated bulk reorder by slug
//! - [`rename_and_retag`]: ad-hoc corrections
//! - [`list_active_categories`] / [`audit_ordering`]: the ordered read
//!
//! Operations are written against [`CatalogStore`]; [`PgCatalogStore`] is the
//! PostgreSQL implementation and [`crate::test_helpers::MemoryCatalogStore`]
//! the in-memory one.

pub mod error;
pub mod listing;
pub mod model;
pub mod reorder;
pub mod retag;
pub mod schema;
pub mod store;

pub use error::CatalogError;
pub use listing::{audit_ordering, list_active_categories, OrderCollision, OrderingAudit};
pub use model::{CatalogTable, Category, CategoryMatch, CategoryOrder, Retag, UNSET_ORDER};
pub use reorder::{
    apply_explicit_order, ReassignFailure, ReorderOptions, ReorderReport, SlugOutcome, SlugReport,
};
pub use retag::{rename_and_retag, RetagOutcome};
pub use schema::{backfill_missing_order, ensure_order_column, OrderColumnOutcome};
pub use store::{CatalogStore, PgCatalogStore, ORDER_COLUMN};
