//! Span constructors for store operations (enabled with the `tracing` feature).

use tracing::{info_span, Span};

pub(crate) fn execute_statement_span(query: &str) -> Span {
    // First keyword only; parameters never reach the span.
    let verb = query.split_whitespace().next().unwrap_or("");
    info_span!("bizdir.statement", verb = verb)
}

pub(crate) fn catalog_operation_span(operation: &'static str, table: &str) -> Span {
    info_span!("bizdir.catalog", operation = operation, table = table)
}

pub(crate) fn transaction_span(action: &'static str) -> Span {
    info_span!("bizdir.transaction", action = action)
}
