//! Product query service: filtered reads plus single-row mutations.

use rust_decimal::Decimal;
use tracing::{debug, info};

use catalog_core::{DomainError, DomainResult, ProductId};
use catalog_products::{product::parse_decimal, Category, Product};

use crate::error::StoreError;
use crate::store::{ProductPredicate, ProductStore};

/// Price argument for [`ProductQueries::find_by_price`].
///
/// Text arrives from query strings and may be padded or quoted
/// (`" 12.50 "`, `"\"12.50\""`); it is trimmed before the exact parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceQuery {
    Exact(Decimal),
    Text(String),
}

impl PriceQuery {
    pub fn resolve(&self) -> DomainResult<Decimal> {
        match self {
            PriceQuery::Exact(price) => Ok(*price),
            PriceQuery::Text(raw) => {
                let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'');
                parse_decimal(trimmed)
                    .ok_or_else(|| DomainError::validation(format!("Invalid price: {raw}")))
            }
        }
    }
}

impl From<Decimal> for PriceQuery {
    fn from(value: Decimal) -> Self {
        PriceQuery::Exact(value)
    }
}

impl From<&str> for PriceQuery {
    fn from(value: &str) -> Self {
        PriceQuery::Text(value.to_string())
    }
}

impl From<String> for PriceQuery {
    fn from(value: String) -> Self {
        PriceQuery::Text(value)
    }
}

/// The single filter applied by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Name(String),
    Category(Category),
    Available(bool),
}

impl ListFilter {
    /// First present, non-empty parameter wins: `name`, then `category`,
    /// then `available`; with none of them every product is listed.
    pub fn from_params(
        name: Option<&str>,
        category: Option<&str>,
        available: Option<&str>,
    ) -> DomainResult<Self> {
        fn present<'a>(v: Option<&'a str>) -> Option<&'a str> {
            v.filter(|s| !s.is_empty())
        }

        if let Some(name) = present(name) {
            return Ok(ListFilter::Name(name.to_string()));
        }
        if let Some(category) = present(category) {
            return Category::parse_case_insensitive(category).map(ListFilter::Category);
        }
        if let Some(available) = present(available) {
            let truthy = matches!(available.to_lowercase().as_str(), "true" | "yes" | "1");
            return Ok(ListFilter::Available(truthy));
        }
        Ok(ListFilter::All)
    }
}

fn not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("Product with id '{id}' was not found."))
}

/// Query service over an injected [`ProductStore`].
#[derive(Debug, Clone)]
pub struct ProductQueries<S> {
    store: S,
}

impl<S> ProductQueries<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every stored product, ascending by id.
    pub async fn all(&self) -> Result<Vec<Product>, StoreError> {
        debug!("Listing all products");
        self.store.select(&ProductPredicate::All).await
    }

    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        debug!("Looking up product {id}");
        self.store.get(id).await
    }

    /// Like [`find`](Self::find), but a missing row is a `NotFound` error.
    pub async fn get(&self, id: ProductId) -> Result<Product, StoreError> {
        self.find(id).await?.ok_or_else(|| not_found(id).into())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        debug!("Processing name query for {name}");
        self.store.select(&ProductPredicate::Name(name.to_string())).await
    }

    pub async fn find_by_price(
        &self,
        price: impl Into<PriceQuery>,
    ) -> Result<Vec<Product>, StoreError> {
        let price = price.into().resolve()?;
        debug!("Processing price query for {price}");
        self.store.select(&ProductPredicate::Price(price)).await
    }

    pub async fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError> {
        debug!("Processing available query for {available}");
        self.store.select(&ProductPredicate::Available(available)).await
    }

    pub async fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        debug!("Processing category query for {category}");
        self.store.select(&ProductPredicate::Category(category)).await
    }

    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Product>, StoreError> {
        match filter {
            ListFilter::All => self.all().await,
            ListFilter::Name(name) => self.find_by_name(name).await,
            ListFilter::Category(category) => self.find_by_category(*category).await,
            ListFilter::Available(available) => self.find_by_availability(*available).await,
        }
    }

    /// Persist `product` as a new row. Any caller-supplied id is discarded
    /// and replaced by the one the store assigns.
    pub async fn create(&self, product: &mut Product) -> Result<ProductId, StoreError> {
        info!("Creating {}", product.name());
        product.clear_id();
        let id = self.store.insert(product).await?;
        product.assign_id(id);
        Ok(id)
    }

    /// Overwrite the stored row with the product's current fields.
    ///
    /// An unset (`None` or `0`) id is a caller contract violation, reported as
    /// `InvariantViolation` rather than a client validation error.
    pub async fn update(&self, product: &Product) -> Result<(), StoreError> {
        info!("Saving {}", product.name());
        let id = match product.product_id() {
            Some(id) if !id.is_zero() => id,
            _ => return Err(DomainError::invariant("Update called with empty ID field").into()),
        };

        if !self.store.update(id, product).await? {
            return Err(not_found(id).into());
        }
        Ok(())
    }

    /// Remove the product's row. Unpersisted products and ids that no longer
    /// exist are no-ops.
    pub async fn delete(&self, product: &Product) -> Result<(), StoreError> {
        info!("Deleting {}", product.name());
        match product.product_id() {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(()),
        }
    }

    pub async fn delete_by_id(&self, id: ProductId) -> Result<(), StoreError> {
        if !self.store.delete(id).await? {
            debug!("Product {id} already absent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::InMemoryProductStore;

    fn queries() -> ProductQueries<Arc<InMemoryProductStore>> {
        ProductQueries::new(Arc::new(InMemoryProductStore::new()))
    }

    fn product(name: &str, price: Decimal, available: bool, category: Category) -> Product {
        Product::new(name, format!("{name} description"), price, available, category)
    }

    fn batch() -> Vec<Product> {
        vec![
            product("Fedora", Decimal::new(1250, 2), true, Category::Cloths),
            product("Apple", Decimal::new(99, 2), false, Category::Food),
            product("Fedora", Decimal::new(2000, 2), false, Category::Cloths),
            product("Hammer", Decimal::new(1250, 2), true, Category::Tools),
            product("Tire", Decimal::new(8900, 2), true, Category::Automotive),
        ]
    }

    async fn seed(q: &ProductQueries<Arc<InMemoryProductStore>>) -> Vec<Product> {
        let mut created = Vec::new();
        for mut p in batch() {
            q.create(&mut p).await.unwrap();
            created.push(p);
        }
        created
    }

    #[tokio::test]
    async fn create_assigns_id_and_find_returns_equal_product() {
        let q = queries();
        let mut p = product("Fedora", Decimal::new(1250, 2), true, Category::Cloths);
        let id = q.create(&mut p).await.unwrap();

        assert_eq!(p.product_id(), Some(id));
        assert_eq!(q.find(id).await.unwrap(), Some(p));
    }

    #[tokio::test]
    async fn create_discards_caller_supplied_id() {
        let q = queries();
        let mut p = product("Fedora", Decimal::new(1250, 2), true, Category::Cloths);
        p.assign_id(ProductId::new(500));
        let id = q.create(&mut p).await.unwrap();
        assert_eq!(id, ProductId::new(1));
        assert!(q.find(ProductId::new(500)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_lists_every_product() {
        let q = queries();
        assert!(q.all().await.unwrap().is_empty());
        seed(&q).await;
        assert_eq!(q.all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn update_persists_new_fields() {
        let q = queries();
        let mut p = product("Fedora", Decimal::new(1250, 2), true, Category::Cloths);
        q.create(&mut p).await.unwrap();

        p.set_description("testing");
        q.update(&p).await.unwrap();

        let all = q.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description(), "testing");
        assert_eq!(all[0].product_id(), p.product_id());
    }

    #[tokio::test]
    async fn update_without_id_is_a_contract_violation() {
        let q = queries();
        let p = product("Fedora", Decimal::new(1250, 2), true, Category::Cloths);
        let err = q.update(&p).await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::invariant("Update called with empty ID field"))
        );

        let mut zero = p.clone();
        zero.assign_id(ProductId::new(0));
        let err = q.update(&zero).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn update_of_deleted_row_is_not_found() {
        let q = queries();
        let mut p = product("Fedora", Decimal::new(1250, 2), true, Category::Cloths);
        q.create(&mut p).await.unwrap();
        q.delete(&p).await.unwrap();

        let err = q.update(&p).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_then_find_is_not_found() {
        let q = queries();
        let created = seed(&q).await;
        let id = created[0].product_id().unwrap();

        q.delete(&created[0]).await.unwrap();
        assert!(q.find(id).await.unwrap().is_none());
        assert_eq!(q.all().await.unwrap().len(), 4);

        let err = q.get(id).await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::not_found(format!("Product with id '{id}' was not found.")))
        );
    }

    #[tokio::test]
    async fn deleting_missing_ids_is_a_no_op() {
        let q = queries();
        q.delete_by_id(ProductId::new(404)).await.unwrap();
        q.delete(&product("Ghost", Decimal::ONE, true, Category::Unknown))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn find_by_name_is_exact_and_case_sensitive() {
        let q = queries();
        let created = seed(&q).await;
        let name = created[0].name();
        let expected = created.iter().filter(|p| p.name() == name).count();

        let found = q.find_by_name(name).await.unwrap();
        assert_eq!(found.len(), expected);
        assert!(found.iter().all(|p| p.name() == name));
        assert!(q.find_by_name("fedora").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_price_normalizes_text_input() {
        let q = queries();
        seed(&q).await;

        let exact = q.find_by_price(Decimal::new(1250, 2)).await.unwrap();
        assert_eq!(exact.len(), 2);

        for raw in ["12.50", "  12.50 ", "\"12.50\"", "'12.50'", "12.5"] {
            assert_eq!(q.find_by_price(raw).await.unwrap(), exact, "input {raw:?}");
        }
    }

    #[tokio::test]
    async fn find_by_price_rejects_garbage() {
        let q = queries();
        let err = q.find_by_price("cheap").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));

        // Would only fit after rounding to 28 significant digits.
        let err = q.find_by_price("0.12345678901234567890123456789").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn find_by_availability_and_category() {
        let q = queries();
        let mut shirt = product("Shirt", Decimal::new(1500, 2), true, Category::Cloths);
        q.create(&mut shirt).await.unwrap();
        seed(&q).await;

        let available = q.find_by_availability(true).await.unwrap();
        assert!(available.contains(&shirt));
        assert!(available.iter().all(|p| p.available()));

        let cloths = q.find_by_category(Category::Cloths).await.unwrap();
        assert!(cloths.contains(&shirt));
        assert!(cloths.iter().all(|p| p.category() == Category::Cloths));

        let food = q.find_by_category(Category::Food).await.unwrap();
        assert!(!food.contains(&shirt));
        assert_eq!(food.len(), 1);
    }

    #[test]
    fn list_filter_precedence() {
        assert_eq!(
            ListFilter::from_params(Some("Hat"), Some("food"), Some("true")).unwrap(),
            ListFilter::Name("Hat".to_string())
        );
        assert_eq!(
            ListFilter::from_params(None, Some("food"), Some("true")).unwrap(),
            ListFilter::Category(Category::Food)
        );
        assert_eq!(
            ListFilter::from_params(Some(""), None, Some("true")).unwrap(),
            ListFilter::Available(true)
        );
        assert_eq!(ListFilter::from_params(None, None, None).unwrap(), ListFilter::All);
    }

    #[test]
    fn list_filter_available_tokens() {
        for token in ["true", "TRUE", "yes", "Yes", "1"] {
            assert_eq!(
                ListFilter::from_params(None, None, Some(token)).unwrap(),
                ListFilter::Available(true)
            );
        }
        for token in ["false", "no", "0", "maybe"] {
            assert_eq!(
                ListFilter::from_params(None, None, Some(token)).unwrap(),
                ListFilter::Available(false)
            );
        }
    }

    #[test]
    fn list_filter_rejects_unknown_category() {
        let err = ListFilter::from_params(None, Some("garden"), None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn list_dispatches_on_filter() {
        let q = queries();
        seed(&q).await;
        assert_eq!(q.list(&ListFilter::All).await.unwrap().len(), 5);
        assert_eq!(q.list(&ListFilter::Name("Fedora".into())).await.unwrap().len(), 2);
        assert_eq!(q.list(&ListFilter::Category(Category::Tools)).await.unwrap().len(), 1);
        assert_eq!(q.list(&ListFilter::Available(false)).await.unwrap().len(), 2);
    }
}
