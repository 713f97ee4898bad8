//! Catalog records and the values operations exchange.

use crate::catalog::CatalogError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Value a freshly added `order` column carries; also means "never curated".
pub const UNSET_ORDER: i32 = 0;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

static SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"));

/// A category row as the store holds it.
///
/// Serializes to the shape the presentation layer reads:
/// `{id, name, slug, order, icon, backgroundImage?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    /// `None` when the column is null.
    pub order: Option<i32>,
    #[serde(skip)]
    pub active: bool,
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl Category {
    /// Whether the row still needs a backfilled order.
    pub fn has_unset_order(&self) -> bool {
        matches!(self.order, None | Some(UNSET_ORDER))
    }
}

/// State just written for one row, reported back to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOrder {
    pub name: String,
    pub slug: String,
    pub order: i32,
}

impl fmt::Display for CategoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) -> {}", self.name, self.slug, self.order)
    }
}

/// Which rows a rename/retag applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatch {
    /// Rows with this slug.
    Slug(String),
    /// The row with this id.
    Id(i32),
    /// Rows with this display name. Names are not unique.
    Name(String),
    /// Rows whose name equals `name` or whose slug equals `slug`.
    ///
    /// Kept for corrections against data where the slug was never reliable;
    /// prefer [`CategoryMatch::Slug`] or [`CategoryMatch::Id`].
    NameOrSlug { name: String, slug: String },
}

impl fmt::Display for CategoryMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryMatch::Slug(slug) => write!(f, "slug = '{}'", slug),
            CategoryMatch::Id(id) => write!(f, "id = {}", id),
            CategoryMatch::Name(name) => write!(f, "name = '{}'", name),
            CategoryMatch::NameOrSlug { name, slug } => {
                write!(f, "name = '{}' OR slug = '{}'", name, slug)
            }
        }
    }
}

/// Replacement values for a rename/retag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retag {
    pub name: String,
    pub slug: String,
    pub icon: String,
}

impl Retag {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            icon: icon.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "replacement name cannot be empty".to_string(),
            ));
        }
        if !is_url_safe_slug(&self.slug) {
            return Err(CatalogError::InvalidInput(format!(
                "replacement slug '{}' is not URL-safe (lowercase letters, digits, single hyphens)",
                self.slug
            )));
        }
        Ok(())
    }
}

/// Lowercase ASCII words joined by single hyphens.
pub fn is_url_safe_slug(slug: &str) -> bool {
    SLUG.is_match(slug)
}

/// A validated catalog table name.
///
/// Table names are interpolated into SQL, so only plain lowercase
/// identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable(String);

impl CatalogTable {
    pub fn parse(name: &str) -> Result<Self, CatalogError> {
        if IDENTIFIER.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(CatalogError::InvalidInput(format!(
                "'{}' is not a valid catalog table name",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CatalogTable {
    fn default() -> Self {
        Self("categories".to_string())
    }
}

impl fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
