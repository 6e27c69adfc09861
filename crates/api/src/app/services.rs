use std::sync::Arc;

use catalog_infra::{
    AppConfig, InMemoryProductStore, PostgresProductStore, ProductQueries, ProductStore,
    StoreConfig, StoreError,
};

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn ProductStore>;

/// Dependencies injected into handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductQueries<SharedStore>,
    /// Used for `Location` headers when a request carries no `Host`.
    pub public_base_url: String,
}

impl AppServices {
    pub fn new(store: SharedStore, public_base_url: impl Into<String>) -> Self {
        Self {
            products: ProductQueries::new(store),
            public_base_url: public_base_url.into(),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(public_base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemoryProductStore::new()), public_base_url)
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match &config.store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory product store");
            Ok(AppServices::in_memory(config.public_base_url.clone()))
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!("connecting to Postgres product store");
            let store = PostgresProductStore::connect(database_url, *max_connections).await?;
            store.init_schema().await?;
            Ok(AppServices::new(Arc::new(store), config.public_base_url.clone()))
        }
    }
}
