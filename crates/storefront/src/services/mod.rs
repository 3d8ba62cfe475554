//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Cached product lookups
//! - `checkout` - Pricing, coupon application and order submission

pub mod catalog;
pub mod checkout;

pub use catalog::ProductCatalog;
