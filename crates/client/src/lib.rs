//! Client for the Vitrine storefront checkout API.
//!
//! - [`StorefrontClient`] - typed calls to coupon validation, order
//!   submission and Pix QR endpoints
//! - [`CheckoutSession`] - client-side checkout flow: local cart, local
//!   totals, coupon application, idempotent submission
//! - [`CartStore`] - cart persisted as a JSON file
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_client::{CartStore, CheckoutSession, CustomerInput, StorefrontClient};
//! use vitrine_core::{PaymentMethod, PricingConfig, ProductId};
//!
//! let client = StorefrontClient::new("https://loja.example.com")?;
//! let store = CartStore::new("cart.json");
//! let mut checkout = CheckoutSession::open(client, store, PricingConfig::default()).await?;
//!
//! checkout.add_item(ProductId::new(1), price, 2).await?;
//! checkout.apply_coupon("bemvindo10").await?;
//! let totals = checkout.totals(PaymentMethod::Pix);
//! let order = checkout.submit(&customer, PaymentMethod::Pix).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod error;
mod session;
mod store;

pub use client::StorefrontClient;
pub use error::ClientError;
pub use session::{AppliedCoupon, CheckoutSession, CustomerInput};
pub use store::CartStore;
