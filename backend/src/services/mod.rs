pub mod account;
pub mod activity_log;
pub mod cart;
pub mod checkout;
pub mod geo;
pub mod mailer;
pub mod voucher;
