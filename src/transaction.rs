//! Transaction guard for catalog writes.
//!
//! Wraps a [`CatalogStore`] session in `BEGIN` .. `COMMIT`. A guard that is
//! dropped without [`Transaction::commit`] rolls back, so every early return
//! and every `?` inside an atomic operation leaves the catalog untouched.

use crate::catalog::CatalogStore;
use crate::executor::StoreError;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// An open transaction on a catalog store.
///
/// ```rust
/// use bizdir::test_helpers::MemoryCatalogStore;
/// use bizdir::transaction::Transaction;
/// use bizdir::CatalogStore;
///
/// let store = MemoryCatalogStore::with_orders(&[("a", 1)]);
/// {
///     let _tx = Transaction::begin(&store)?;
///     store.set_order_by_slug("a", 9)?;
///     // dropped without commit
/// }
/// assert_eq!(store.order_of("a"), Some(1));
/// # Ok::<(), bizdir::StoreError>(())
/// ```
pub struct Transaction<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    closed: bool,
}

impl<'a, S: CatalogStore + ?Sized> Transaction<'a, S> {
    /// Start a transaction on `store`.
    pub fn begin(store: &'a S) -> Result<Self, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::transaction_span("begin").entered();

        store.begin()?;
        Ok(Self {
            store,
            closed: false,
        })
    }

    /// Commit every write made since [`Transaction::begin`].
    pub fn commit(mut self) -> Result<(), StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::transaction_span("commit").entered();

        self.closed = true;
        self.store.commit()
    }

    /// Discard every write made since [`Transaction::begin`].
    pub fn rollback(mut self) -> Result<(), StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::transaction_span("rollback").entered();

        self.closed = true;
        self.store.rollback()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: CatalogStore + ?Sized> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Errors cannot propagate out of drop.
        if let Err(e) = self.store.rollback() {
            log::warn!("rollback of abandoned transaction failed: {}", e);
        } else {
            log::debug!("abandoned transaction rolled back");
        }
    }
}
