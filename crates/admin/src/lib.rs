//! Vitrine admin library.
//!
//! Order lifecycle and coupon management for back-office staff. Deploy on
//! a private network only; every API call needs the admin bearer token.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
