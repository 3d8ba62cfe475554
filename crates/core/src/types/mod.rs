//! Core types for Vitrine.
//!
//! Type-safe wrappers for IDs, emails, statuses and money amounts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MONEY_SCALE, format_brl, round_money};
pub use status::{OrderStatus, PaymentMethod, StatusTransitionError};
