//! bizdir maintenance library
//!
//! Argument-independent pieces of the `bizdir-maint` CLI (main.rs).

pub mod order_file;
pub mod report;

use bizdir::catalog::CategoryMatch;

/// Build the rename/retag matcher from the CLI's match flags.
///
/// `--match-id` wins; `--match-name` with `--match-slug` selects the
/// name-or-slug compatibility match; either flag alone matches on that field.
pub fn matcher_from_args(
    match_id: Option<i32>,
    match_slug: Option<String>,
    match_name: Option<String>,
) -> Option<CategoryMatch> {
    match (match_id, match_slug, match_name) {
        (Some(id), _, _) => Some(CategoryMatch::Id(id)),
        (None, Some(slug), Some(name)) => Some(CategoryMatch::NameOrSlug { name, slug }),
        (None, None, Some(name)) => Some(CategoryMatch::Name(name)),
        (None, Some(slug), None) => Some(CategoryMatch::Slug(slug)),
        (None, None, None) => None,
    }
}
