//! Domain models for storefront.

pub mod product;
pub mod session;

pub use product::Product;
