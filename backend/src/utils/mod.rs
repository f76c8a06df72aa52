pub mod data_protection;
pub mod jwt;
pub mod mfa;
pub mod password;
pub mod security;

pub use jwt::*;
pub use password::*;
