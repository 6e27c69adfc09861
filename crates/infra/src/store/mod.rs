//! Product persistence boundary.
//!
//! The query service talks to storage only through [`ProductStore`], so the
//! relational backend and the in-memory backend used for dev/test are
//! interchangeable.

use std::sync::Arc;

use rust_decimal::Decimal;

use catalog_core::ProductId;
use catalog_products::{Category, Product};

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;

/// Single-column equality filter executed by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductPredicate {
    All,
    Name(String),
    Price(Decimal),
    Available(bool),
    Category(Category),
}

impl ProductPredicate {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            ProductPredicate::All => true,
            ProductPredicate::Name(name) => product.name() == name,
            ProductPredicate::Price(price) => product.price() == *price,
            ProductPredicate::Available(available) => product.available() == *available,
            ProductPredicate::Category(category) => product.category() == *category,
        }
    }
}

/// Row-level product storage.
///
/// Every call is one unit of work: implementations acquire whatever session
/// they need and release it before returning, on success and on error.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new row and return its freshly assigned identifier.
    async fn insert(&self, product: &Product) -> Result<ProductId, StoreError>;

    /// Overwrite the row with `id`. Returns `false` when no such row exists.
    async fn update(&self, id: ProductId, product: &Product) -> Result<bool, StoreError>;

    /// Remove the row with `id`. Returns `false` when no such row existed.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Rows matching `predicate`, ascending by id.
    async fn select(&self, predicate: &ProductPredicate) -> Result<Vec<Product>, StoreError>;
}

#[async_trait::async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, product: &Product) -> Result<ProductId, StoreError> {
        (**self).insert(product).await
    }

    async fn update(&self, id: ProductId, product: &Product) -> Result<bool, StoreError> {
        (**self).update(id, product).await
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }

    async fn select(&self, predicate: &ProductPredicate) -> Result<Vec<Product>, StoreError> {
        (**self).select(predicate).await
    }
}
