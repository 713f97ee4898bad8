//! Catalog maintenance error types

use crate::connection::ConnectionError;
use crate::executor::StoreError;

/// Errors surfaced by catalog operations.
///
/// Every variant is fatal to the operation that returns it. Per-slug
/// failures of a best-effort reorder are not errors; they are recorded in
/// the [`crate::catalog::ReorderReport`] instead.
#[derive(Debug)]
pub enum CatalogError {
    /// Required configuration missing or unusable; no store access attempted
    Configuration(String),
    /// The store could not be reached when the session opened
    Connection(ConnectionError),
    /// Adding the `order` column failed
    SchemaMigration(StoreError),
    /// A read or write against the catalog failed
    StoreWrite {
        intent: &'static str,
        slug: Option<String>,
        source: StoreError,
    },
    /// Caller-supplied input rejected before any write
    InvalidInput(String),
}

impl CatalogError {
    pub(crate) fn store(intent: &'static str, source: StoreError) -> Self {
        CatalogError::StoreWrite {
            intent,
            slug: None,
            source,
        }
    }

    pub(crate) fn for_slug(intent: &'static str, slug: &str, source: StoreError) -> Self {
        CatalogError::StoreWrite {
            intent,
            slug: Some(slug.to_string()),
            source,
        }
    }

    /// The slug a store failure was scoped to, if any.
    pub fn slug(&self) -> Option<&str> {
        match self {
            CatalogError::StoreWrite { slug, .. } => slug.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            CatalogError::Connection(e) => write!(f, "Could not open catalog store: {}", e),
            CatalogError::SchemaMigration(e) => {
                write!(f, "Schema migration failed while ensuring the order column: {}", e)
            }
            CatalogError::StoreWrite {
                intent,
                slug: Some(slug),
                source,
            } => write!(f, "Store error while trying to {} (slug '{}'): {}", intent, slug, source),
            CatalogError::StoreWrite {
                intent,
                slug: None,
                source,
            } => write!(f, "Store error while trying to {}: {}", intent, source),
            CatalogError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Connection(e) => Some(e),
            CatalogError::SchemaMigration(e) => Some(e),
            CatalogError::StoreWrite { source, .. } => Some(source),
            CatalogError::Configuration(_) | CatalogError::InvalidInput(_) => None,
        }
    }
}

impl From<ConnectionError> for CatalogError {
    fn from(error: ConnectionError) -> Self {
        CatalogError::Connection(error)
    }
}
