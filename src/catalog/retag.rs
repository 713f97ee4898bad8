//! Ad-hoc category corrections.

use crate::catalog::model::{Category, CategoryMatch, Retag};
use crate::catalog::store::CatalogStore;
use crate::catalog::CatalogError;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetagOutcome {
    /// Rows as they read after the update.
    Updated(Vec<Category>),
    /// Nothing matched; nothing was written.
    NoMatch,
}

/// Replace name, slug and icon on every category `matcher` selects.
///
/// Each matched row is updated in a single statement. Matching nothing is a
/// normal outcome, not an error.
pub fn rename_and_retag<S>(
    store: &S,
    matcher: &CategoryMatch,
    retag: &Retag,
) -> Result<RetagOutcome, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span("rename_and_retag", store.table()).entered();

    retag.validate()?;
    if let CategoryMatch::Name(_) | CategoryMatch::NameOrSlug { .. } = matcher {
        log::warn!("matching by display name ({}); names are not unique", matcher);
    }

    let updated = store
        .retag(matcher, retag)
        .map_err(|e| CatalogError::store("rename and retag category", e))?;

    if updated.is_empty() {
        log::info!("no category matched {}", matcher);
        return Ok(RetagOutcome::NoMatch);
    }
    for category in &updated {
        log::info!(
            "retagged category {} -> {} ({}) {}",
            category.id,
            category.name,
            category.slug,
            category.icon.as_deref().unwrap_or("")
        );
    }
    Ok(RetagOutcome::Updated(updated))
}
