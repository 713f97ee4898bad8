//! # bizdir
//!
//! Ordered category catalog for the business directory.
//!
//! The crate owns the maintenance side of the `categories` table: the
//! schema evolution that introduces the `order` column, the backfill of
//! unset orders, curated bulk reordering, ad-hoc rename/retag corrections
//! and the ordered read the presentation layer consumes.
//!
//! ```rust,no_run
//! use bizdir::{config::DatabaseConfig, session::with_store};
//! use bizdir::catalog::{apply_explicit_order, ReorderOptions};
//!
//! # fn main() -> Result<(), bizdir::CatalogError> {
//! let config = DatabaseConfig::load()?;
//! let report = with_store(&config, |store| {
//!     apply_explicit_order(store, &["restaurants", "shopping"], ReorderOptions::default())
//! })?;
//! println!("{} slug(s) applied", report.applied_count());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod executor;
pub mod session;
pub mod test_helpers;
pub mod transaction;

#[cfg(feature = "tracing")]
mod tracing_helpers;

pub use catalog::{CatalogError, CatalogStore, Category, CategoryOrder, PgCatalogStore};
pub use connection::{connect, ConnectionError};
pub use executor::{Executor, PgExecutor, StoreError};
