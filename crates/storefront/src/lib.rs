//! Vitrine storefront library.
//!
//! Public checkout API: catalog, session cart, coupon validation, order
//! submission and Pix payloads. Exposed as a library so the router can be
//! exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
