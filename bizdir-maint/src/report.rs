//! Operator-facing rendering of operation results.
//!
//! Functions return plain lines; `main` decides on colour and stream.

use bizdir::catalog::{
    Category, CategoryOrder, OrderColumnOutcome, OrderingAudit, ReorderReport, RetagOutcome,
    SlugOutcome,
};

pub fn order_column_line(table: &str, outcome: OrderColumnOutcome) -> String {
    match outcome {
        OrderColumnOutcome::Added => format!("✅ Added \"order\" column to {} (default 0)", table),
        OrderColumnOutcome::AlreadyPresent => {
            format!("✅ {} already has an \"order\" column; nothing to do", table)
        }
    }
}

pub fn backfill_lines(written: &[CategoryOrder]) -> Vec<String> {
    if written.is_empty() {
        return vec!["✅ No categories with unset order".to_string()];
    }
    let mut lines: Vec<String> = written.iter().map(|r| format!("  ✓ {}", r)).collect();
    lines.push(format!("✅ Backfilled {} categor{}", written.len(), plural_y(written.len())));
    lines
}

pub fn reorder_lines(report: &ReorderReport) -> Vec<String> {
    let mut lines = Vec::new();
    for slug in &report.slugs {
        match &slug.outcome {
            SlugOutcome::Applied(records) => {
                for record in records {
                    lines.push(format!("  ✓ {}", record));
                }
            }
            SlugOutcome::Unmatched => {
                lines.push(format!("  ⏭ {} (position {}): no such category", slug.slug, slug.position))
            }
            SlugOutcome::Failed(reason) => lines.push(format!(
                "  ✗ {} (position {}): {}",
                slug.slug, slug.position, reason
            )),
        }
    }
    for record in &report.reassigned {
        lines.push(format!("  ↳ {}", record));
    }
    for failure in &report.reassign_failures {
        lines.push(format!("  ✗ reassign {}: {}", failure.target, failure.reason));
    }
    lines.push(format!(
        "📈 Summary: {} applied, {} unmatched, {} failed, {} reassigned",
        report.applied_count(),
        report.unmatched_count(),
        report.failed_count() + report.reassign_failures.len(),
        report.reassigned.len()
    ));
    lines
}

pub fn retag_lines(outcome: &RetagOutcome) -> Vec<String> {
    match outcome {
        RetagOutcome::NoMatch => vec!["⚠️  No matching category; nothing changed".to_string()],
        RetagOutcome::Updated(rows) => rows
            .iter()
            .map(|c| {
                format!(
                    "  ✓ #{} {} ({}) {}",
                    c.id,
                    c.name,
                    c.slug,
                    c.icon.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            })
            .collect(),
    }
}

pub fn listing_lines(categories: &[Category]) -> Vec<String> {
    categories
        .iter()
        .map(|c| {
            let order = c
                .order
                .map(|o| o.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{:>4}  {:<3} {} ({})",
                order,
                c.icon.as_deref().unwrap_or(""),
                c.name,
                c.slug
            )
        })
        .collect()
}

pub fn audit_lines(audit: &OrderingAudit) -> Vec<String> {
    if audit.is_clean() {
        return vec![format!(
            "✅ {} active categories ordered 1..={}",
            audit.total, audit.total
        )];
    }
    let mut lines = Vec::new();
    if !audit.unset.is_empty() {
        lines.push(format!("⚠️  Unset order: {}", audit.unset.join(", ")));
    }
    for collision in &audit.collisions {
        lines.push(format!(
            "⚠️  Order {} shared by: {}",
            collision.order,
            collision.slugs.join(", ")
        ));
    }
    if !audit.contiguous {
        lines.push(format!("⚠️  Orders are not exactly 1..={}", audit.total));
    }
    lines
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}
