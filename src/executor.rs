//! Statement execution over `may_postgres`.
//!
//! [`Executor`] is the narrow seam between the catalog store and the wire
//! client: execute a statement, fetch one row, fetch all rows.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Store-level error type
#[derive(Debug)]
pub enum StoreError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Row parsing/conversion error
    ParseError(String),
    /// Statement rejected or failed for a non-driver reason
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            StoreError::ParseError(s) => write!(f, "Parse error: {s}"),
            StoreError::Other(s) => write!(f, "Store error: {s}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        StoreError::PostgresError(err)
    }
}

/// Trait for executing database statements
///
/// Implemented by [`PgExecutor`]; the catalog store is generic over it so a
/// borrowed executor works as well as an owned one.
pub trait Executor {
    /// Execute a SQL statement and return the number of rows affected
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError>;

    /// Execute a query expected to return exactly one row
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError>;

    /// Execute a query and return all rows
    fn query_all(&self, query: &str, params: &[&dyn ToSql])
        -> Result<Vec<Row>, StoreError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        (**self).execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        (**self).query_one(query, params)
    }

    fn query_all(
        &self,
        query: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<Row>, StoreError> {
        (**self).query_all(query, params)
    }
}

/// `Executor` over an owned `may_postgres::Client`.
///
/// Dropping the executor drops the client and closes the session.
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Executor for PgExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_statement_span(query).entered();

        let start = Instant::now();
        let result = self.client.execute(query, params).map_err(StoreError::from);
        log::trace!("execute took {:?}: {}", start.elapsed(), query.trim());
        result
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_statement_span(query).entered();

        let start = Instant::now();
        let result = self.client.query_one(query, params).map_err(StoreError::from);
        log::trace!("query_one took {:?}: {}", start.elapsed(), query.trim());
        result
    }

    fn query_all(
        &self,
        query: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<Row>, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_statement_span(query).entered();

        let start = Instant::now();
        let result = self.client.query(query, params).map_err(StoreError::from);
        log::trace!("query_all took {:?}: {}", start.elapsed(), query.trim());
        result
    }
}
