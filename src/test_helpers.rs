//! In-memory catalog store for tests.
//!
//! [`MemoryCatalogStore`] follows the PostgreSQL store's statement semantics
//! (default-0 column add, nulls-last ordering, `RETURNING` rows) and lets a
//! test inject failures per slug, for schema changes, reads or all writes.

use crate::catalog::{CatalogStore, Category, CategoryMatch, CategoryOrder, Retag, UNSET_ORDER};
use crate::executor::StoreError;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// Build an active category with a name derived from its slug.
pub fn category(id: i32, slug: &str, order: Option<i32>) -> Category {
    Category {
        id,
        name: title_case(slug),
        slug: slug.to_string(),
        order,
        active: true,
        icon: None,
        background_image: None,
    }
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub struct MemoryCatalogStore {
    rows: RefCell<Vec<Category>>,
    order_column: Cell<bool>,
    snapshot: RefCell<Option<Vec<Category>>>,
    failing_slugs: RefCell<HashSet<String>>,
    fail_schema: Cell<bool>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
    alterations: Cell<usize>,
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl MemoryCatalogStore {
    /// A store whose table already has the `order` column.
    pub fn from_rows(rows: Vec<Category>) -> Self {
        Self {
            rows: RefCell::new(rows),
            order_column: Cell::new(true),
            snapshot: RefCell::new(None),
            failing_slugs: RefCell::new(HashSet::new()),
            fail_schema: Cell::new(false),
            fail_reads: Cell::new(false),
            fail_writes: Cell::new(false),
            writes: Cell::new(0),
            alterations: Cell::new(0),
        }
    }

    /// Active categories with ids `1..` in the given sequence.
    pub fn with_orders(entries: &[(&str, i32)]) -> Self {
        Self::from_rows(
            entries
                .iter()
                .zip(1..)
                .map(|((slug, order), id)| category(id, slug, Some(*order)))
                .collect(),
        )
    }

    /// A table predating the `order` column.
    pub fn without_order_column(slugs: &[&str]) -> Self {
        let store = Self::from_rows(
            slugs
                .iter()
                .zip(1..)
                .map(|(slug, id)| category(id, slug, None))
                .collect(),
        );
        store.order_column.set(false);
        store
    }

    /// Make every write touching `slug` fail.
    pub fn fail_slug(&self, slug: &str) {
        self.failing_slugs.borrow_mut().insert(slug.to_string());
    }

    pub fn fail_schema_changes(&self) {
        self.fail_schema.set(true);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.set(true);
    }

    pub fn fail_all_writes(&self) {
        self.fail_writes.set(true);
    }

    /// Order of the first row with `slug`, `None` when absent or null.
    pub fn order_of(&self, slug: &str) -> Option<i32> {
        self.rows
            .borrow()
            .iter()
            .find(|c| c.slug == slug)
            .and_then(|c| c.order)
    }

    pub fn rows(&self) -> Vec<Category> {
        self.rows.borrow().clone()
    }

    pub fn has_order_column(&self) -> bool {
        self.order_column.get()
    }

    /// Rows written so far (committed or not).
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Number of `ALTER TABLE` statements executed.
    pub fn alter_count(&self) -> usize {
        self.alterations.get()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.borrow().is_some()
    }

    fn check_write(&self, slug: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() || self.failing_slugs.borrow().contains(slug) {
            return Err(StoreError::Other(format!(
                "simulated write failure for slug '{}'",
                slug
            )));
        }
        Ok(())
    }

    fn require_order_column(&self) -> Result<(), StoreError> {
        if self.order_column.get() {
            Ok(())
        } else {
            Err(StoreError::Other(
                "column \"order\" does not exist".to_string(),
            ))
        }
    }

    fn write_rows<P>(&self, mut matches: P, order: i32) -> Result<Vec<CategoryOrder>, StoreError>
    where
        P: FnMut(&Category) -> bool,
    {
        self.require_order_column()?;
        let mut rows = self.rows.borrow_mut();
        // A statement fails as a whole: check before touching anything.
        for row in rows.iter().filter(|c| matches(c)) {
            self.check_write(&row.slug)?;
        }
        let mut written = Vec::new();
        for row in rows.iter_mut().filter(|c| matches(c)) {
            row.order = Some(order);
            written.push(CategoryOrder {
                name: row.name.clone(),
                slug: row.slug.clone(),
                order,
            });
        }
        self.writes.set(self.writes.get() + written.len());
        Ok(written)
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn table(&self) -> &str {
        "categories"
    }

    fn has_column(&self, column: &str) -> Result<bool, StoreError> {
        if self.fail_schema.get() {
            return Err(StoreError::Other("simulated schema inspection failure".to_string()));
        }
        Ok(match column {
            "order" => self.order_column.get(),
            "id" | "name" | "slug" | "active" | "icon" => true,
            _ => false,
        })
    }

    fn add_order_column(&self) -> Result<(), StoreError> {
        if self.fail_schema.get() {
            return Err(StoreError::Other("simulated ALTER TABLE failure".to_string()));
        }
        self.alterations.set(self.alterations.get() + 1);
        if !self.order_column.get() {
            self.order_column.set(true);
            for row in self.rows.borrow_mut().iter_mut() {
                row.order = Some(UNSET_ORDER);
            }
        }
        Ok(())
    }

    fn backfill_unset_order(&self) -> Result<Vec<CategoryOrder>, StoreError> {
        self.require_order_column()?;
        if self.fail_writes.get() {
            return Err(StoreError::Other("simulated backfill failure".to_string()));
        }
        let mut written = Vec::new();
        for row in self.rows.borrow_mut().iter_mut() {
            if row.has_unset_order() {
                row.order = Some(row.id);
                written.push(CategoryOrder {
                    name: row.name.clone(),
                    slug: row.slug.clone(),
                    order: row.id,
                });
            }
        }
        self.writes.set(self.writes.get() + written.len());
        Ok(written)
    }

    fn set_order_by_slug(&self, slug: &str, order: i32) -> Result<Vec<CategoryOrder>, StoreError> {
        self.write_rows(|c| c.slug == slug, order)
    }

    fn set_order_by_id(&self, id: i32, order: i32) -> Result<Option<CategoryOrder>, StoreError> {
        Ok(self.write_rows(|c| c.id == id, order)?.into_iter().next())
    }

    fn list_active(&self) -> Result<Vec<Category>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Other("simulated read failure".to_string()));
        }
        self.require_order_column()?;
        let mut active: Vec<Category> = self
            .rows
            .borrow()
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect();
        active.sort_by_key(|c| (c.order.is_none(), c.order, c.id));
        Ok(active)
    }

    fn retag(&self, matcher: &CategoryMatch, retag: &Retag) -> Result<Vec<Category>, StoreError> {
        let is_match = |c: &Category| match matcher {
            CategoryMatch::Slug(slug) => &c.slug == slug,
            CategoryMatch::Id(id) => c.id == *id,
            CategoryMatch::Name(name) => &c.name == name,
            CategoryMatch::NameOrSlug { name, slug } => &c.name == name || &c.slug == slug,
        };
        let mut rows = self.rows.borrow_mut();
        for row in rows.iter().filter(|c| is_match(c)) {
            self.check_write(&row.slug)?;
        }
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|c| is_match(c)) {
            row.name = retag.name.clone();
            row.slug = retag.slug.clone();
            row.icon = Some(retag.icon.clone());
            updated.push(row.clone());
        }
        self.writes.set(self.writes.get() + updated.len());
        Ok(updated)
    }

    fn begin(&self) -> Result<(), StoreError> {
        let mut snapshot = self.snapshot.borrow_mut();
        if snapshot.is_some() {
            return Err(StoreError::Other("transaction already in progress".to_string()));
        }
        *snapshot = Some(self.rows.borrow().clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        match self.snapshot.borrow_mut().take() {
            Some(_) => Ok(()),
            None => Err(StoreError::Other("no transaction in progress".to_string())),
        }
    }

    fn rollback(&self) -> Result<(), StoreError> {
        match self.snapshot.borrow_mut().take() {
            Some(saved) => {
                *self.rows.borrow_mut() = saved;
                Ok(())
            }
            None => Err(StoreError::Other("no transaction in progress".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("home-services"), "Home Services");
        assert_eq!(title_case("pets"), "Pets");
    }

    #[test]
    fn test_failed_statement_writes_nothing() {
        let store = MemoryCatalogStore::from_rows(vec![
            category(1, "gyms", Some(3)),
            category(2, "gyms", Some(4)),
        ]);
        store.fail_slug("gyms");

        assert!(store.set_order_by_slug("gyms", 1).is_err());
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.order_of("gyms"), Some(3));
    }

    #[test]
    fn test_writes_require_order_column() {
        let store = MemoryCatalogStore::without_order_column(&["gyms"]);

        assert!(store.set_order_by_slug("gyms", 1).is_err());
        assert!(store.backfill_unset_order().is_err());
    }
}
