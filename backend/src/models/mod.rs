//! Data models shared across database access and API handlers.

pub mod activity_log;
pub mod cart;
pub mod homepage;
pub mod product;
pub mod support_ticket;
pub mod transaction;
pub mod user;
pub mod voucher;
pub mod wishlist;
