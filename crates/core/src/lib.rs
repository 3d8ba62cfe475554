//! Vitrine Core - Shared checkout domain library.
//!
//! This crate provides the types and rules used across all Vitrine components:
//! - `storefront` - Public checkout API (cart, coupons, orders, Pix)
//! - `admin` - Back-office API (order lifecycle, coupon administration)
//! - `client` - Typed storefront client with a persisted cart
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The optional `postgres` feature adds
//! `sqlx` encodings for the id and enum types.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money helpers, emails, order status and payment method
//! - [`coupon`] - Coupon codes, effects and the validity predicate
//! - [`cart`] - The session cart value
//! - [`pricing`] - Shipping, discounts and the payable total
//! - [`pix`] - Pix BR Code payloads
//! - [`order`] - Order submission request and stored order shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod coupon;
pub mod order;
pub mod pix;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use coupon::{
    Coupon, CouponCode, CouponCodeError, CouponEffect, CouponEffectError, CouponKind,
    CouponValidateRequest, CouponValidation, RejectionReason,
};
pub use order::{
    CheckoutRejection, CustomerDetails, Order, OrderItemRequest, OrderLine, OrderRequest,
    OrderRequestError,
};
pub use pix::{PixCharge, PixError, PixQrRequest, PixQrResponse};
pub use pricing::{CheckoutTotals, PricingConfig, compute_totals};
pub use types::*;
