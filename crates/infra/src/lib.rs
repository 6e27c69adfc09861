//! Infrastructure layer: product storage, query service, configuration.

pub mod config;
pub mod error;
pub mod query;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use error::StoreError;
pub use query::{ListFilter, PriceQuery, ProductQueries};
pub use store::{InMemoryProductStore, PostgresProductStore, ProductPredicate, ProductStore};
