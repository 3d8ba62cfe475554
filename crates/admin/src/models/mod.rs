//! API types for the admin.

pub mod coupon;
pub mod order;

pub use coupon::{CouponRecord, NewCoupon};
pub use order::{OrderListQuery, OrderSummary, StatusUpdate};
