//! The catalog store seam and its PostgreSQL implementation.

use crate::catalog::model::{CatalogTable, Category, CategoryMatch, CategoryOrder, Retag};
use crate::executor::{Executor, StoreError};
use may_postgres::Row;
use once_cell::unsync::OnceCell;
use sea_query::{Alias, ColumnDef, PostgresQueryBuilder, Table};

/// Name of the display-order column. Reserved word, always quoted in SQL.
pub const ORDER_COLUMN: &str = "order";

const BACKGROUND_IMAGE_COLUMN: &str = "background_image";

/// Primitive reads and writes the catalog operations are built from.
///
/// Each method is a single statement against the store. Methods take `&self`
/// so a store can be shared by an operation and its [`crate::transaction::Transaction`].
pub trait CatalogStore {
    /// Name of the catalog table, for logs.
    fn table(&self) -> &str;

    /// Whether `column` exists on the catalog table.
    fn has_column(&self, column: &str) -> Result<bool, StoreError>;

    /// Add the `order` column (integer, default 0) unless it already exists.
    fn add_order_column(&self) -> Result<(), StoreError>;

    /// Set `order := id` on every row whose order is 0 or null.
    fn backfill_unset_order(&self) -> Result<Vec<CategoryOrder>, StoreError>;

    /// Set `order` on every row with `slug`; returns the rows written.
    fn set_order_by_slug(&self, slug: &str, order: i32) -> Result<Vec<CategoryOrder>, StoreError>;

    /// Set `order` on the row with `id`; `None` when no such row exists.
    fn set_order_by_id(&self, id: i32, order: i32) -> Result<Option<CategoryOrder>, StoreError>;

    /// Active rows by ascending stored order (`0` first, nulls last), ties by id.
    fn list_active(&self) -> Result<Vec<Category>, StoreError>;

    /// Replace name, slug and icon on every matching row; returns the rows written.
    fn retag(&self, matcher: &CategoryMatch, retag: &Retag) -> Result<Vec<Category>, StoreError>;

    fn begin(&self) -> Result<(), StoreError>;

    fn commit(&self) -> Result<(), StoreError>;

    fn rollback(&self) -> Result<(), StoreError>;
}

/// [`CatalogStore`] backed by PostgreSQL through an [`Executor`].
pub struct PgCatalogStore<E: Executor> {
    executor: E,
    table: CatalogTable,
    background_image: OnceCell<bool>,
}

impl<E: Executor> PgCatalogStore<E> {
    pub fn new(executor: E, table: CatalogTable) -> Self {
        Self {
            executor,
            table,
            background_image: OnceCell::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// `ALTER TABLE .. ADD COLUMN IF NOT EXISTS "order" integer DEFAULT 0`
    pub fn add_order_column_sql(&self) -> String {
        Table::alter()
            .table(Alias::new(self.table.as_str()))
            .add_column_if_not_exists(ColumnDef::new(Alias::new(ORDER_COLUMN)).integer().default(0))
            .to_owned()
            .build(PostgresQueryBuilder)
    }

    fn select_columns(&self) -> Result<String, StoreError> {
        let has_image = match self.background_image.get() {
            Some(has_image) => *has_image,
            None => {
                let has_image = self.has_column(BACKGROUND_IMAGE_COLUMN)?;
                let _ = self.background_image.set(has_image);
                has_image
            }
        };
        let image = if has_image {
            BACKGROUND_IMAGE_COLUMN
        } else {
            "NULL::text AS background_image"
        };
        Ok(format!(
            r#"id, name, slug, "order", active, icon, {}"#,
            image
        ))
    }
}

fn category_from_row(row: &Row) -> Result<Category, StoreError> {
    let parse = |column: &str, e: may_postgres::Error| {
        StoreError::ParseError(format!("column '{}': {}", column, e))
    };
    Ok(Category {
        id: row.try_get("id").map_err(|e| parse("id", e))?,
        name: row.try_get("name").map_err(|e| parse("name", e))?,
        slug: row.try_get("slug").map_err(|e| parse("slug", e))?,
        order: row.try_get("order").map_err(|e| parse("order", e))?,
        active: row.try_get("active").map_err(|e| parse("active", e))?,
        icon: row.try_get("icon").map_err(|e| parse("icon", e))?,
        background_image: row
            .try_get("background_image")
            .map_err(|e| parse("background_image", e))?,
    })
}

fn confirmation_from_row(row: &Row) -> Result<CategoryOrder, StoreError> {
    let parse = |column: &str, e: may_postgres::Error| {
        StoreError::ParseError(format!("column '{}': {}", column, e))
    };
    Ok(CategoryOrder {
        name: row.try_get("name").map_err(|e| parse("name", e))?,
        slug: row.try_get("slug").map_err(|e| parse("slug", e))?,
        order: row.try_get("order").map_err(|e| parse("order", e))?,
    })
}

impl<E: Executor> CatalogStore for PgCatalogStore<E> {
    fn table(&self) -> &str {
        self.table.as_str()
    }

    fn has_column(&self, column: &str) -> Result<bool, StoreError> {
        let sql = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = current_schema()
                  AND table_name = $1
                  AND column_name = $2
            )
        "#;
        let table = self.table.as_str();
        let row = self.executor.query_one(sql, &[&table, &column])?;
        row.try_get(0)
            .map_err(|e| StoreError::ParseError(format!("column existence flag: {}", e)))
    }

    fn add_order_column(&self) -> Result<(), StoreError> {
        let sql = self.add_order_column_sql();
        // DDL statements don't have parameters
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    fn backfill_unset_order(&self) -> Result<Vec<CategoryOrder>, StoreError> {
        let sql = format!(
            r#"UPDATE {} SET "order" = id
               WHERE "order" IS NULL OR "order" = 0
               RETURNING name, slug, "order""#,
            self.table
        );
        let rows = self.executor.query_all(&sql, &[])?;
        rows.iter().map(confirmation_from_row).collect()
    }

    fn set_order_by_slug(&self, slug: &str, order: i32) -> Result<Vec<CategoryOrder>, StoreError> {
        let sql = format!(
            r#"UPDATE {} SET "order" = $1 WHERE slug = $2 RETURNING name, slug, "order""#,
            self.table
        );
        let rows = self.executor.query_all(&sql, &[&order, &slug])?;
        rows.iter().map(confirmation_from_row).collect()
    }

    fn set_order_by_id(&self, id: i32, order: i32) -> Result<Option<CategoryOrder>, StoreError> {
        let sql = format!(
            r#"UPDATE {} SET "order" = $1 WHERE id = $2 RETURNING name, slug, "order""#,
            self.table
        );
        let rows = self.executor.query_all(&sql, &[&order, &id])?;
        rows.first().map(confirmation_from_row).transpose()
    }

    fn list_active(&self) -> Result<Vec<Category>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM {}
               WHERE active = true
               ORDER BY "order" ASC NULLS LAST, id ASC"#,
            self.select_columns()?,
            self.table
        );
        let rows = self.executor.query_all(&sql, &[])?;
        rows.iter().map(category_from_row).collect()
    }

    fn retag(&self, matcher: &CategoryMatch, retag: &Retag) -> Result<Vec<Category>, StoreError> {
        let returning = self.select_columns()?;
        let rows = match matcher {
            CategoryMatch::Slug(slug) => {
                let sql = format!(
                    "UPDATE {} SET name = $1, slug = $2, icon = $3 WHERE slug = $4 RETURNING {}",
                    self.table, returning
                );
                self.executor
                    .query_all(&sql, &[&retag.name, &retag.slug, &retag.icon, slug])?
            }
            CategoryMatch::Id(id) => {
                let sql = format!(
                    "UPDATE {} SET name = $1, slug = $2, icon = $3 WHERE id = $4 RETURNING {}",
                    self.table, returning
                );
                self.executor
                    .query_all(&sql, &[&retag.name, &retag.slug, &retag.icon, id])?
            }
            CategoryMatch::Name(name) => {
                let sql = format!(
                    "UPDATE {} SET name = $1, slug = $2, icon = $3 WHERE name = $4 RETURNING {}",
                    self.table, returning
                );
                self.executor
                    .query_all(&sql, &[&retag.name, &retag.slug, &retag.icon, name])?
            }
            CategoryMatch::NameOrSlug { name, slug } => {
                let sql = format!(
                    "UPDATE {} SET name = $1, slug = $2, icon = $3 \
                     WHERE name = $4 OR slug = $5 RETURNING {}",
                    self.table, returning
                );
                self.executor.query_all(
                    &sql,
                    &[&retag.name, &retag.slug, &retag.icon, name, slug],
                )?
            }
        };
        rows.iter().map(category_from_row).collect()
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.executor.execute("BEGIN", &[]).map(|_| ())
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.executor.execute("COMMIT", &[]).map(|_| ())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        self.executor.execute("ROLLBACK", &[]).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use may_postgres::types::ToSql;
    use std::cell::RefCell;

    /// Records statements; every query returns no rows.
    #[derive(Default)]
    struct RecordingExecutor {
        statements: RefCell<Vec<(String, usize)>>,
    }

    impl RecordingExecutor {
        fn record(&self, query: &str, params: &[&dyn ToSql]) {
            self.statements
                .borrow_mut()
                .push((query.split_whitespace().collect::<Vec<_>>().join(" "), params.len()));
        }
    }

    impl Executor for RecordingExecutor {
        fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
            self.record(query, params);
            Ok(0)
        }

        fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
            self.record(query, params);
            Err(StoreError::Other("no rows".to_string()))
        }

        fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
            self.record(query, params);
            Ok(Vec::new())
        }
    }

    fn store() -> PgCatalogStore<RecordingExecutor> {
        PgCatalogStore::new(RecordingExecutor::default(), CatalogTable::default())
    }

    fn last_statement(store: &PgCatalogStore<RecordingExecutor>) -> (String, usize) {
        store.executor().statements.borrow().last().cloned().unwrap()
    }

    #[test]
    fn test_add_order_column_sql() {
        let sql = store().add_order_column_sql();
        assert!(sql.starts_with(r#"ALTER TABLE "categories" ADD COLUMN IF NOT EXISTS "order""#));
        assert!(sql.contains("integer"));
        assert!(sql.contains("DEFAULT 0"));
    }

    #[test]
    fn test_set_order_by_slug_binds_parameters() {
        let store = store();
        let written = store.set_order_by_slug("pets", 3).unwrap();

        assert!(written.is_empty());
        let (sql, params) = last_statement(&store);
        assert_eq!(
            sql,
            r#"UPDATE categories SET "order" = $1 WHERE slug = $2 RETURNING name, slug, "order""#
        );
        assert_eq!(params, 2);
    }

    #[test]
    fn test_backfill_targets_null_and_zero() {
        let store = store();
        store.backfill_unset_order().unwrap();

        let (sql, params) = last_statement(&store);
        assert!(sql.contains(r#"WHERE "order" IS NULL OR "order" = 0"#));
        assert_eq!(params, 0);
    }

    #[test]
    fn test_schema_probe_failure_surfaces_from_reads() {
        // query_one fails, so the background_image probe cannot complete.
        let store = store();
        assert!(store.list_active().is_err());
        assert!(store.executor().statements.borrow()[0]
            .0
            .contains("information_schema.columns"));
    }

    #[test]
    fn test_transaction_statements() {
        let store = store();
        store.begin().unwrap();
        store.rollback().unwrap();
        store.begin().unwrap();
        store.commit().unwrap();

        let statements: Vec<String> = store
            .executor()
            .statements
            .borrow()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect();
        assert_eq!(statements, vec!["BEGIN", "ROLLBACK", "BEGIN", "COMMIT"]);
    }
}
