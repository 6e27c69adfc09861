//! Postgres-backed product store.
//!
//! ## Sessions
//!
//! Reads borrow a pooled connection for the duration of one query. Writes run
//! inside a transaction that is committed explicitly; a transaction dropped on
//! any early return (including errors) is rolled back and its connection goes
//! back to the pool.
//!
//! ## Schema
//!
//! `category` is stored as the member name (`TEXT` + `CHECK`), never as an
//! ordinal. `id` is a `BIGSERIAL`, so identifiers start at 1 and are never
//! reused after a delete.

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};

use catalog_core::ProductId;
use catalog_products::product::{DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS};
use catalog_products::{Category, Product};
use rust_decimal::Decimal;

use super::{ProductPredicate, ProductStore};
use crate::error::{map_sqlx_error, StoreError};

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, available, category FROM products";

pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `products` table when it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let members = Category::ALL
            .iter()
            .map(|c| format!("'{}'", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR({NAME_MAX_CHARS}) NOT NULL,
                description VARCHAR({DESCRIPTION_MAX_CHARS}) NOT NULL,
                price NUMERIC NOT NULL,
                available BOOLEAN NOT NULL DEFAULT TRUE,
                category TEXT NOT NULL DEFAULT '{default}' CHECK (category IN ({members}))
            )
            "#,
            default = Category::default().as_str(),
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;

        tracing::info!("products table ready");
        Ok(())
    }
}

fn ordered(where_clause: &str) -> String {
    format!("{SELECT_COLUMNS} {where_clause} ORDER BY id ASC")
}

fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let description: String = row.try_get("description").map_err(decode)?;
    let price: Decimal = row.try_get("price").map_err(decode)?;
    let available: bool = row.try_get("available").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let category = decode_category(&category, id)?;

    let mut product = Product::new(name, description, price, available, category);
    product.assign_id(ProductId::new(id));
    Ok(product)
}

fn decode_category(raw: &str, id: i64) -> Result<Category, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Decode(format!("unknown category '{raw}' in row {id}")))
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, product), fields(name = %product.name()), err)]
    async fn insert(&self, product: &Product) -> Result<ProductId, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, available, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(product.available())
        .bind(product.category().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tx.commit().await.map_err(|e| map_sqlx_error("insert", e))?;
        Ok(ProductId::new(id))
    }

    #[instrument(skip(self, product), fields(id = %id), err)]
    async fn update(&self, id: ProductId, product: &Product) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, available = $5, category = $6
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(product.available())
        .bind(product.category().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("update", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(row_to_product).transpose()
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn select(&self, predicate: &ProductPredicate) -> Result<Vec<Product>, StoreError> {
        let query = match predicate {
            ProductPredicate::All => ordered(""),
            ProductPredicate::Name(_) => ordered("WHERE name = $1"),
            ProductPredicate::Price(_) => ordered("WHERE price = $1"),
            ProductPredicate::Available(_) => ordered("WHERE available = $1"),
            ProductPredicate::Category(_) => ordered("WHERE category = $1"),
        };

        let q = sqlx::query(&query);
        let q = match predicate {
            ProductPredicate::All => q,
            ProductPredicate::Name(name) => q.bind(name.clone()),
            ProductPredicate::Price(price) => q.bind(*price),
            ProductPredicate::Available(available) => q.bind(*available),
            ProductPredicate::Category(category) => q.bind(category.as_str()),
        };

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("select", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(row_to_product).collect()
    }
}
