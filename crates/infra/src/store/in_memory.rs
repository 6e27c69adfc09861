use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use catalog_core::ProductId;
use catalog_products::Product;

use super::{ProductPredicate, ProductStore};
use crate::error::StoreError;

/// In-memory product store for tests/dev.
///
/// Identifiers start at 1 and are never handed out twice, even after deletes.
#[derive(Debug)]
pub struct InMemoryProductStore {
    rows: RwLock<BTreeMap<ProductId, Product>>,
    next_id: AtomicI64,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<ProductId, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let id = ProductId::new(self.next_id.fetch_add(1, Ordering::SeqCst));

        let mut row = product.clone();
        row.assign_id(id);
        rows.insert(id, row);
        Ok(id)
    }

    async fn update(&self, id: ProductId, product: &Product) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        match rows.get_mut(&id) {
            Some(row) => {
                *row = product.clone();
                row.assign_id(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.remove(&id).is_some())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn select(&self, predicate: &ProductPredicate) -> Result<Vec<Product>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.values().filter(|p| predicate.matches(p)).cloned().collect())
    }
}
