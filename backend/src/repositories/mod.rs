//! Data access. Each aggregate has a trait, a Postgres implementation, and an
//! implementation on [`MemoryStore`].

pub mod activity_log;
pub mod cart;
pub mod common;
pub mod homepage;
pub mod memory;
pub mod product;
pub mod support_ticket;
pub mod transaction;
pub mod user;
pub mod voucher;
pub mod wishlist;

use std::sync::Arc;

use sqlx::PgPool;

pub use activity_log::{ActivityLogRepository, PgActivityLogRepository};
pub use cart::{CartRepository, PgCartRepository};
pub use homepage::{HomepageRepository, PgHomepageRepository};
pub use memory::MemoryStore;
pub use product::{PgProductRepository, ProductRepository};
pub use support_ticket::{
    ChatRepository, PgChatRepository, PgSupportTicketRepository, SupportTicketRepository,
};
pub use transaction::{PgTransactionRepository, TransactionRepository};
pub use user::{PgUserRepository, UserRepository};
pub use voucher::{PgVoucherRepository, VoucherRepository};
pub use wishlist::{PgWishlistRepository, WishlistRepository};

/// Repository handles shared through the application state.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub vouchers: Arc<dyn VoucherRepository>,
    pub wishlists: Arc<dyn WishlistRepository>,
    pub homepages: Arc<dyn HomepageRepository>,
    pub tickets: Arc<dyn SupportTicketRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub activity_logs: Arc<dyn ActivityLogRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            transactions: Arc::new(PgTransactionRepository::new(pool.clone())),
            vouchers: Arc::new(PgVoucherRepository::new(pool.clone())),
            wishlists: Arc::new(PgWishlistRepository::new(pool.clone())),
            homepages: Arc::new(PgHomepageRepository::new(pool.clone())),
            tickets: Arc::new(PgSupportTicketRepository::new(pool.clone())),
            chats: Arc::new(PgChatRepository::new(pool.clone())),
            activity_logs: Arc::new(PgActivityLogRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(MemoryStore::new())
    }

    /// Shares one store across every handle, so tests can seed it directly.
    pub fn from_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            products: store.clone(),
            carts: store.clone(),
            transactions: store.clone(),
            vouchers: store.clone(),
            wishlists: store.clone(),
            homepages: store.clone(),
            tickets: store.clone(),
            chats: store.clone(),
            activity_logs: store,
        }
    }
}
