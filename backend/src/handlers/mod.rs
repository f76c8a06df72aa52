pub mod admin;
pub mod cart;
pub mod homepages;
pub mod products;
pub mod support;
pub mod transactions;
pub mod users;
pub mod vouchers;
pub mod wishlists;
