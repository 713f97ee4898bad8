//! Curated bulk reordering by slug.
//!
//! The caller supplies the intended sequence; the slug at 0-based position
//! `i` gets `order = i + 1`. Slugs are written one at a time, in input order.

use crate::catalog::model::{is_url_safe_slug, Category, CategoryOrder, UNSET_ORDER};
use crate::catalog::store::CatalogStore;
use crate::catalog::CatalogError;
use crate::transaction::Transaction;
use std::collections::HashSet;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// How [`apply_explicit_order`] treats rows and failures outside the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderOptions {
    /// Renumber every active category not named in the list to follow the
    /// listed range (N+1, N+2, ..) in its previous relative order. Without it
    /// unlisted rows keep their old values, which may collide with 1..N.
    pub complete_reassignment: bool,
    /// Run every write in one transaction and stop at the first failure,
    /// rolling back all of them. Without it each slug is independent.
    pub atomic: bool,
}

/// Result of writing one listed slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugOutcome {
    /// One confirmation per stored row carrying the slug.
    Applied(Vec<CategoryOrder>),
    /// No stored category has this slug; nothing was written.
    Unmatched,
    /// The write failed; the message carries the store's reason.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugReport {
    pub slug: String,
    /// The order value this slug was assigned (1-based list position).
    pub position: i32,
    pub outcome: SlugOutcome,
}

/// A tail renumbering write that failed in best-effort mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignFailure {
    pub target: String,
    pub reason: String,
}

/// Everything an explicit reorder did, in the order it did it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderReport {
    pub slugs: Vec<SlugReport>,
    /// Rows renumbered by complete reassignment.
    pub reassigned: Vec<CategoryOrder>,
    pub reassign_failures: Vec<ReassignFailure>,
}

impl ReorderReport {
    pub fn applied_count(&self) -> usize {
        self.count(|o| matches!(o, SlugOutcome::Applied(_)))
    }

    pub fn unmatched_count(&self) -> usize {
        self.count(|o| matches!(o, SlugOutcome::Unmatched))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, SlugOutcome::Failed(_)))
    }

    /// No listed slug and no tail write failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0 && self.reassign_failures.is_empty()
    }

    /// Every confirmation record for the listed slugs, in input order.
    pub fn confirmations(&self) -> impl Iterator<Item = &CategoryOrder> {
        self.slugs.iter().flat_map(|s| {
            let records: &[CategoryOrder] = match &s.outcome {
                SlugOutcome::Applied(records) => records,
                _ => &[],
            };
            records
        })
    }

    fn count(&self, pred: impl Fn(&SlugOutcome) -> bool) -> usize {
        self.slugs.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Assign `order = position + 1` to each listed slug.
///
/// Unknown slugs are reported as [`SlugOutcome::Unmatched`]. In the default
/// best-effort mode a failing slug is reported as [`SlugOutcome::Failed`] and
/// the remaining slugs are still written; with [`ReorderOptions::atomic`] the
/// first failure rolls everything back and is returned as the error.
///
/// Blank slugs, slugs with surrounding whitespace and slugs listed twice are
/// rejected before any write.
///
/// ```rust
/// use bizdir::catalog::{apply_explicit_order, ReorderOptions};
/// use bizdir::test_helpers::MemoryCatalogStore;
///
/// let store = MemoryCatalogStore::with_orders(&[("a", 7), ("b", 8), ("c", 9)]);
/// let report = apply_explicit_order(&store, &["b", "a"], ReorderOptions::default())?;
///
/// assert_eq!(report.applied_count(), 2);
/// assert_eq!(store.order_of("b"), Some(1));
/// assert_eq!(store.order_of("a"), Some(2));
/// assert_eq!(store.order_of("c"), Some(9));
/// # Ok::<(), bizdir::CatalogError>(())
/// ```
pub fn apply_explicit_order<S, T>(
    store: &S,
    ordered_slugs: &[T],
    options: ReorderOptions,
) -> Result<ReorderReport, CatalogError>
where
    S: CatalogStore + ?Sized,
    T: AsRef<str>,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span("apply_explicit_order", store.table()).entered();

    let slugs = validate_slugs(ordered_slugs)?;
    log::info!(
        "applying explicit order for {} slug(s) to {} (complete reassignment: {}, atomic: {})",
        slugs.len(),
        store.table(),
        options.complete_reassignment,
        options.atomic
    );

    if !options.atomic {
        return run(store, &slugs, options);
    }

    let tx = Transaction::begin(store)
        .map_err(|e| CatalogError::store("begin reorder transaction", e))?;
    // Any error below drops `tx`, which rolls back.
    let report = run(store, &slugs, options)?;
    tx.commit()
        .map_err(|e| CatalogError::store("commit reorder transaction", e))?;
    Ok(report)
}

fn validate_slugs<T: AsRef<str>>(ordered_slugs: &[T]) -> Result<Vec<&str>, CatalogError> {
    if i32::try_from(ordered_slugs.len()).is_err() {
        return Err(CatalogError::InvalidInput(format!(
            "{} slugs cannot be numbered with integer orders",
            ordered_slugs.len()
        )));
    }

    let mut seen = HashSet::with_capacity(ordered_slugs.len());
    let mut slugs = Vec::with_capacity(ordered_slugs.len());
    for (index, slug) in ordered_slugs.iter().enumerate() {
        let slug = slug.as_ref();
        if slug.trim().is_empty() {
            return Err(CatalogError::InvalidInput(format!(
                "slug at position {} is blank",
                index + 1
            )));
        }
        if slug.trim() != slug {
            return Err(CatalogError::InvalidInput(format!(
                "slug '{}' at position {} has surrounding whitespace",
                slug,
                index + 1
            )));
        }
        if !seen.insert(slug) {
            return Err(CatalogError::InvalidInput(format!(
                "slug '{}' is listed more than once",
                slug
            )));
        }
        if !is_url_safe_slug(slug) {
            // Legacy data may hold such slugs; match them anyway.
            log::warn!("slug '{}' is not URL-safe", slug);
        }
        slugs.push(slug);
    }
    Ok(slugs)
}

fn run<S>(store: &S, slugs: &[&str], options: ReorderOptions) -> Result<ReorderReport, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    let mut report = ReorderReport::default();

    for (index, slug) in slugs.iter().enumerate() {
        // Length checked by validate_slugs.
        let position = index as i32 + 1;
        let outcome = match store.set_order_by_slug(slug, position) {
            Ok(records) if records.is_empty() => {
                log::warn!("no category with slug '{}'; skipped", slug);
                SlugOutcome::Unmatched
            }
            Ok(records) => {
                for record in &records {
                    log::info!("ordered {}", record);
                }
                SlugOutcome::Applied(records)
            }
            Err(e) if options.atomic => {
                return Err(CatalogError::for_slug("apply explicit order", slug, e));
            }
            Err(e) => {
                log::error!("failed to order '{}': {}", slug, e);
                SlugOutcome::Failed(e.to_string())
            }
        };
        report.slugs.push(SlugReport {
            slug: (*slug).to_string(),
            position,
            outcome,
        });
    }

    if options.complete_reassignment {
        reassign_unlisted(store, slugs, options, &mut report)?;
    }

    log::info!(
        "explicit order done: {} applied, {} unmatched, {} failed, {} reassigned",
        report.applied_count(),
        report.unmatched_count(),
        report.failed_count(),
        report.reassigned.len()
    );
    Ok(report)
}

/// Number active rows outside the list from `slugs.len() + 1` onwards.
fn reassign_unlisted<S>(
    store: &S,
    slugs: &[&str],
    options: ReorderOptions,
    report: &mut ReorderReport,
) -> Result<(), CatalogError>
where
    S: CatalogStore + ?Sized,
{
    let active = match store.list_active() {
        Ok(active) => active,
        Err(e) if options.atomic => {
            return Err(CatalogError::store("list categories for reassignment", e));
        }
        Err(e) => {
            log::error!("cannot reassign unlisted categories: {}", e);
            report.reassign_failures.push(ReassignFailure {
                target: "active category listing".to_string(),
                reason: e.to_string(),
            });
            return Ok(());
        }
    };

    let listed: HashSet<&str> = slugs.iter().copied().collect();
    let mut tail: Vec<&Category> = active
        .iter()
        .filter(|c| !listed.contains(c.slug.as_str()))
        .collect();
    // Unlike the listing, 0 and null both count as unset here and go last.
    tail.sort_by_key(|c| (c.has_unset_order(), c.order.unwrap_or(UNSET_ORDER), c.id));

    // slugs.len() fits in i32 (validate_slugs); the tail is bounded by the table.
    let mut next = slugs.len() as i32;
    for category in tail {
        next += 1;
        if category.order == Some(next) {
            continue;
        }
        match store.set_order_by_id(category.id, next) {
            Ok(Some(record)) => {
                log::info!("reassigned {}", record);
                report.reassigned.push(record);
            }
            // Deleted since the listing; nothing to renumber.
            Ok(None) => log::warn!("category {} vanished during reassignment", category.id),
            Err(e) if options.atomic => {
                return Err(CatalogError::for_slug(
                    "reassign unlisted category",
                    &category.slug,
                    e,
                ));
            }
            Err(e) => {
                log::error!("failed to reassign '{}': {}", category.slug, e);
                report.reassign_failures.push(ReassignFailure {
                    target: category.slug.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(())
}
