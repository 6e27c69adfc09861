//! Products domain module.
//!
//! This crate contains the product entity and its serialization/validation
//! contract, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod category;
pub mod product;

pub use category::Category;
pub use product::Product;
