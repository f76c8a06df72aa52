//! In-process implementation of every repository trait.
//!
//! Selected with `DATABASE_URL=memory://` and used by the API tests. All
//! tables live behind one lock, so every operation (including the
//! multi-step writes) is atomic with respect to other requests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::activity_log::{ActivityLog, NewActivityLog};
use crate::models::cart::{Cart, CartItem, NewCartItem};
use crate::models::homepage::Homepage;
use crate::models::product::{Product, ProductSize};
use crate::models::support_ticket::{Chat, SupportTicket};
use crate::models::transaction::{
    NewTransactionItem, Transaction, TransactionDetails, TransactionItem,
};
use crate::models::user::User;
use crate::models::voucher::{NewUserVoucher, RedemptionOutcome, UserVoucher, Voucher};
use crate::models::wishlist::Wishlist;
use crate::repositories::{
    ActivityLogRepository, CartRepository, ChatRepository, HomepageRepository, ProductRepository,
    SupportTicketRepository, TransactionRepository, UserRepository, VoucherRepository,
    WishlistRepository,
};
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    sequences: HashMap<&'static str, i64>,
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    transactions: BTreeMap<TransactionId, Transaction>,
    vouchers: BTreeMap<VoucherId, Voucher>,
    claims: BTreeMap<UserVoucherId, UserVoucher>,
    wishlists: BTreeMap<WishlistId, Wishlist>,
    homepages: BTreeMap<HomepageId, Homepage>,
    tickets: BTreeMap<SupportTicketId, SupportTicket>,
    chats: BTreeMap<ChatId, Chat>,
    activity_logs: Vec<ActivityLog>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let next = self.sequences.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    fn cart_of(&mut self, user_id: UserId) -> Option<&mut Cart> {
        self.carts.values_mut().find(|cart| cart.user_id == user_id)
    }

    fn cart_holding(&mut self, item_id: CartItemId) -> Option<&mut Cart> {
        self.carts
            .values_mut()
            .find(|cart| cart.items.iter().any(|item| item.id == item_id))
    }
}

fn duplicate_user(existing: &User, candidate: &User) -> Option<AppError> {
    if existing.username == candidate.username {
        Some(AppError::unique_violation(Some("users_username_key")))
    } else if existing.email == candidate.email {
        Some(AppError::unique_violation(Some("users_email_key")))
    } else {
        None
    }
}

fn contains_ci(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(&term.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|user| match &search {
                Some(term) => contains_ci(&user.username, term) || contains_ci(&user.email, term),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_reset_token(&self, token_digest: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.password_reset_token.as_deref() == Some(token_digest))
            .cloned())
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(err) = tables
            .users
            .values()
            .find_map(|existing| duplicate_user(existing, user))
        {
            return Err(err);
        }
        let mut created = user.clone();
        created.id = UserId::new(tables.next_id("users"));
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(err) = tables
            .users
            .values()
            .filter(|existing| existing.id != user.id)
            .find_map(|existing| duplicate_user(existing, user))
        {
            return Err(err);
        }
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;
        *stored = user.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let listed: Vec<ProductId> = tables
            .products
            .values()
            .filter(|product| product.user_id == id)
            .map(|product| product.id)
            .collect();
        tables.products.retain(|_, product| product.user_id != id);
        for cart in tables.carts.values_mut() {
            cart.items.retain(|item| !listed.contains(&item.product_id));
        }
        for wishlist in tables.wishlists.values_mut() {
            wishlist.product_ids.retain(|product| !listed.contains(product));
        }
        for homepage in tables.homepages.values_mut() {
            homepage.product_ids.retain(|product| !listed.contains(product));
        }
        tables.carts.retain(|_, cart| cart.user_id != id);
        tables.transactions.retain(|_, tx| tx.user_id != id);
        tables.claims.retain(|_, claim| claim.user_id != id);
        tables.wishlists.retain(|_, wishlist| wishlist.user_id != id);
        let owned: Vec<SupportTicketId> = tables
            .tickets
            .values()
            .filter(|ticket| ticket.owner_id == id)
            .map(|ticket| ticket.id)
            .collect();
        tables.tickets.retain(|_, ticket| ticket.owner_id != id);
        tables
            .chats
            .retain(|_, chat| chat.sender_id != id && !owned.contains(&chat.ticket_id));
        for ticket in tables.tickets.values_mut() {
            if ticket.assigned_to == Some(id) {
                ticket.assigned_to = None;
            }
        }
        for log in tables.activity_logs.iter_mut() {
            if log.user_id == Some(id) {
                log.user_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|product| search.as_deref().map_or(true, |term| product.matches(term)))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create(&self, product: &Product) -> AppResult<Product> {
        let mut tables = self.tables.write().await;
        let mut created = product.clone();
        created.id = ProductId::new(tables.next_id("products"));
        for size in created.sizes.iter_mut() {
            size.id = ProductSizeId::new(tables.next_id("product_sizes"));
            size.product_id = created.id;
        }
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut tables = self.tables.write().await;
        let existing_sizes = tables
            .products
            .get(&product.id)
            .map(|stored| stored.sizes.clone())
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;

        let mut sizes = Vec::with_capacity(product.sizes.len());
        for size in &product.sizes {
            let id = match existing_sizes.iter().find(|old| old.size == size.size) {
                Some(old) => old.id,
                None => ProductSizeId::new(tables.next_id("product_sizes")),
            };
            sizes.push(ProductSize {
                id,
                product_id: product.id,
                size: size.size.clone(),
                price: size.price,
            });
        }
        let kept: Vec<ProductSizeId> = sizes.iter().map(|size| size.id).collect();
        for cart in tables.carts.values_mut() {
            cart.items.retain(|item| {
                item.product_id != product.id
                    || item.product_size_id.map_or(true, |size| kept.contains(&size))
            });
        }

        let mut updated = product.clone();
        updated.sizes = sizes;
        tables.products.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: ProductId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        for cart in tables.carts.values_mut() {
            cart.items.retain(|item| item.product_id != id);
        }
        for wishlist in tables.wishlists.values_mut() {
            wishlist.product_ids.retain(|product| *product != id);
        }
        for homepage in tables.homepages.values_mut() {
            homepage.product_ids.retain(|product| *product != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<Cart>> {
        let tables = self.tables.read().await;
        Ok(tables
            .carts
            .values()
            .find(|cart| cart.user_id == user_id)
            .cloned())
    }

    async fn get_or_create(&self, user_id: UserId) -> AppResult<Cart> {
        let mut tables = self.tables.write().await;
        if let Some(cart) = tables.cart_of(user_id) {
            return Ok(cart.clone());
        }
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(tables.next_id("carts")),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn add_item(&self, cart_id: CartId, item: NewCartItem) -> AppResult<CartItem> {
        let mut tables = self.tables.write().await;
        let id = CartItemId::new(tables.next_id("cart_items"));
        let cart = tables
            .carts
            .get_mut(&cart_id)
            .ok_or(AppError::NotFound("Cart not found".to_string()))?;
        let now = Utc::now();
        let created = CartItem {
            id,
            cart_id,
            product_id: item.product_id,
            product_size_id: item.product_size_id,
            quantity: item.quantity,
            price: item.price,
            created_at: now,
        };
        cart.items.push(created.clone());
        cart.updated_at = now;
        Ok(created)
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> AppResult<Option<CartItem>> {
        let mut tables = self.tables.write().await;
        let Some(cart) = tables.cart_holding(item_id) else {
            return Ok(None);
        };
        cart.updated_at = Utc::now();
        let item = cart.items.iter_mut().find(|item| item.id == item_id);
        Ok(item.map(|item| {
            item.quantity = quantity;
            item.clone()
        }))
    }

    async fn remove_item(&self, item_id: CartItemId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(cart) = tables.cart_holding(item_id) else {
            return Ok(false);
        };
        cart.items.retain(|item| item.id != item_id);
        cart.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn find_open(&self, user_id: UserId) -> AppResult<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .values()
            .find(|tx| tx.user_id == user_id && !tx.is_finalized)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut list: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn discard_open(&self, user_id: UserId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.transactions.len();
        tables
            .transactions
            .retain(|_, tx| tx.user_id != user_id || tx.is_finalized);
        Ok(tables.transactions.len() < before)
    }

    async fn open_for_user(
        &self,
        user_id: UserId,
        items: Vec<NewTransactionItem>,
    ) -> AppResult<Transaction> {
        let mut tables = self.tables.write().await;
        tables
            .transactions
            .retain(|_, tx| tx.user_id != user_id || tx.is_finalized);

        let id = TransactionId::new(tables.next_id("transactions"));
        let mut created_items = Vec::with_capacity(items.len());
        for item in items {
            created_items.push(TransactionItem {
                id: TransactionItemId::new(tables.next_id("transaction_items")),
                transaction_id: id,
                product_id: item.product_id,
                product_size_id: item.product_size_id,
                product_name: item.product_name,
                quantity: item.quantity,
                price: item.price,
            });
        }
        let now = Utc::now();
        let transaction = Transaction {
            id,
            user_id,
            items: created_items,
            shipping_address: None,
            delivery_time: None,
            payment_method: None,
            card_holder: None,
            card_number_encrypted: None,
            card_last4: None,
            card_expiry: None,
            is_finalized: false,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        };
        tables.transactions.insert(id, transaction.clone());
        Ok(transaction)
    }

    async fn update_details(
        &self,
        id: TransactionId,
        details: TransactionDetails,
    ) -> AppResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;
        let Some(tx) = tables
            .transactions
            .get_mut(&id)
            .filter(|tx| !tx.is_finalized)
        else {
            return Ok(None);
        };
        tx.shipping_address = Some(details.shipping_address);
        tx.delivery_time = details.delivery_time;
        tx.payment_method = Some(details.payment_method);
        tx.card_holder = Some(details.card_holder);
        tx.card_number_encrypted = Some(details.card_number_encrypted);
        tx.card_last4 = Some(details.card_last4);
        tx.card_expiry = Some(details.card_expiry);
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn finalize(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> AppResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let finalized = match tables
            .transactions
            .get_mut(&id)
            .filter(|tx| tx.user_id == user_id && !tx.is_finalized)
        {
            Some(tx) => {
                tx.is_finalized = true;
                tx.finalized_at = Some(now);
                tx.updated_at = now;
                tx.clone()
            }
            None => return Ok(None),
        };
        tables.carts.retain(|_, cart| cart.user_id != user_id);
        Ok(Some(finalized))
    }
}

#[async_trait]
impl VoucherRepository for MemoryStore {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Voucher>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vouchers
            .values()
            .filter(|voucher| search.as_deref().map_or(true, |term| voucher.matches(term)))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: VoucherId) -> AppResult<Option<Voucher>> {
        Ok(self.tables.read().await.vouchers.get(&id).cloned())
    }

    async fn create(&self, voucher: &Voucher) -> AppResult<Voucher> {
        let mut tables = self.tables.write().await;
        let mut created = voucher.clone();
        created.id = VoucherId::new(tables.next_id("vouchers"));
        tables.vouchers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, voucher: &Voucher) -> AppResult<Voucher> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .vouchers
            .get_mut(&voucher.id)
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;
        *stored = voucher.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: VoucherId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.vouchers.remove(&id).is_none() {
            return Ok(false);
        }
        tables.claims.retain(|_, claim| claim.voucher_id != id);
        Ok(true)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.claims.values().any(|claim| claim.code == code))
    }

    async fn redeem(&self, claim: NewUserVoucher, cost: i32) -> AppResult<RedemptionOutcome> {
        let mut tables = self.tables.write().await;

        match tables.vouchers.get(&claim.voucher_id) {
            Some(voucher) if voucher.quantity > 0 => {}
            _ => return Ok(RedemptionOutcome::SoldOut),
        }
        match tables.users.get(&claim.user_id) {
            Some(user) if user.reward_points >= cost => {}
            _ => return Ok(RedemptionOutcome::InsufficientPoints),
        }
        if tables.claims.values().any(|existing| existing.code == claim.code) {
            return Ok(RedemptionOutcome::CodeTaken);
        }

        let now = Utc::now();
        let voucher = match tables.vouchers.get_mut(&claim.voucher_id) {
            Some(voucher) => {
                let (remaining, status) = voucher.after_redemption();
                voucher.quantity = remaining;
                voucher.status = status;
                voucher.updated_at = now;
                voucher.clone()
            }
            None => return Ok(RedemptionOutcome::SoldOut),
        };
        if let Some(user) = tables.users.get_mut(&claim.user_id) {
            user.reward_points -= cost;
            user.updated_at = now;
        }
        let created = UserVoucher {
            id: UserVoucherId::new(tables.next_id("user_vouchers")),
            user_id: claim.user_id,
            voucher_id: claim.voucher_id,
            code: claim.code,
            claimed_at: claim.claimed_at,
            valid_till: claim.valid_till,
            is_used: false,
        };
        tables.claims.insert(created.id, created.clone());
        Ok(RedemptionOutcome::Redeemed {
            voucher,
            claim: created,
        })
    }

    async fn list_claims(&self, user_id: UserId) -> AppResult<Vec<UserVoucher>> {
        let tables = self.tables.read().await;
        let mut claims: Vec<UserVoucher> = tables
            .claims
            .values()
            .filter(|claim| claim.user_id == user_id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.claimed_at.cmp(&a.claimed_at).then(b.id.cmp(&a.id)));
        Ok(claims)
    }

    async fn find_claim(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>> {
        Ok(self.tables.read().await.claims.get(&id).cloned())
    }

    async fn mark_claim_used(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>> {
        let mut tables = self.tables.write().await;
        Ok(tables.claims.get_mut(&id).map(|claim| {
            claim.is_used = true;
            claim.clone()
        }))
    }
}

#[async_trait]
impl WishlistRepository for MemoryStore {
    async fn list_for_user(
        &self,
        user_id: UserId,
        search: Option<String>,
    ) -> AppResult<Vec<Wishlist>> {
        let tables = self.tables.read().await;
        Ok(tables
            .wishlists
            .values()
            .filter(|wishlist| wishlist.user_id == user_id)
            .filter(|wishlist| search.as_deref().map_or(true, |term| wishlist.matches(term)))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: WishlistId) -> AppResult<Option<Wishlist>> {
        Ok(self.tables.read().await.wishlists.get(&id).cloned())
    }

    async fn create(&self, wishlist: &Wishlist) -> AppResult<Wishlist> {
        let mut tables = self.tables.write().await;
        let mut created = wishlist.clone();
        created.id = WishlistId::new(tables.next_id("wishlists"));
        tables.wishlists.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, wishlist: &Wishlist) -> AppResult<Wishlist> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .wishlists
            .get_mut(&wishlist.id)
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;
        *stored = wishlist.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: WishlistId) -> AppResult<bool> {
        Ok(self.tables.write().await.wishlists.remove(&id).is_some())
    }

    async fn add_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let wishlist = tables
            .wishlists
            .get_mut(&id)
            .ok_or(AppError::NotFound("Wishlist not found".to_string()))?;
        if !wishlist.contains(product_id) {
            wishlist.product_ids.push(product_id);
            wishlist.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn remove_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(wishlist) = tables.wishlists.get_mut(&id) else {
            return Ok(false);
        };
        let before = wishlist.product_ids.len();
        wishlist.product_ids.retain(|product| *product != product_id);
        Ok(wishlist.product_ids.len() != before)
    }
}

#[async_trait]
impl HomepageRepository for MemoryStore {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Homepage>> {
        let tables = self.tables.read().await;
        Ok(tables
            .homepages
            .values()
            .filter(|homepage| search.as_deref().map_or(true, |term| homepage.matches(term)))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: HomepageId) -> AppResult<Option<Homepage>> {
        Ok(self.tables.read().await.homepages.get(&id).cloned())
    }

    async fn create(&self, homepage: &Homepage) -> AppResult<Homepage> {
        let mut tables = self.tables.write().await;
        let mut created = homepage.clone();
        created.id = HomepageId::new(tables.next_id("homepages"));
        tables.homepages.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, homepage: &Homepage) -> AppResult<Homepage> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .homepages
            .get_mut(&homepage.id)
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;
        *stored = homepage.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: HomepageId) -> AppResult<bool> {
        Ok(self.tables.write().await.homepages.remove(&id).is_some())
    }
}

#[async_trait]
impl SupportTicketRepository for MemoryStore {
    async fn list(
        &self,
        participant: Option<UserId>,
        search: Option<String>,
    ) -> AppResult<Vec<SupportTicket>> {
        let tables = self.tables.read().await;
        let mut tickets: Vec<SupportTicket> = tables
            .tickets
            .values()
            .filter(|ticket| match participant {
                Some(user) => ticket.owner_id == user || ticket.assigned_to == Some(user),
                None => true,
            })
            .filter(|ticket| search.as_deref().map_or(true, |term| ticket.matches(term)))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tickets)
    }

    async fn find_by_id(&self, id: SupportTicketId) -> AppResult<Option<SupportTicket>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn create(&self, ticket: &SupportTicket) -> AppResult<SupportTicket> {
        let mut tables = self.tables.write().await;
        let mut created = ticket.clone();
        created.id = SupportTicketId::new(tables.next_id("support_tickets"));
        tables.tickets.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, ticket: &SupportTicket) -> AppResult<SupportTicket> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .tickets
            .get_mut(&ticket.id)
            .ok_or(AppError::NotFound("Resource not found".to_string()))?;
        *stored = ticket.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: SupportTicketId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.tickets.remove(&id).is_none() {
            return Ok(false);
        }
        tables.chats.retain(|_, chat| chat.ticket_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn list_for_ticket(&self, ticket_id: SupportTicketId) -> AppResult<Vec<Chat>> {
        let tables = self.tables.read().await;
        Ok(tables
            .chats
            .values()
            .filter(|chat| chat.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        ticket_id: SupportTicketId,
        sender_id: UserId,
        message: String,
    ) -> AppResult<Chat> {
        let mut tables = self.tables.write().await;
        if !tables.tickets.contains_key(&ticket_id) {
            return Err(AppError::NotFound("Support ticket not found".to_string()));
        }
        let chat = Chat {
            id: ChatId::new(tables.next_id("chats")),
            ticket_id,
            sender_id,
            message,
            created_at: Utc::now(),
        };
        tables.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryStore {
    async fn insert(&self, entry: NewActivityLog) -> AppResult<ActivityLog> {
        let mut tables = self.tables.write().await;
        let log = ActivityLog {
            id: ActivityLogId::new(tables.next_id("activity_logs")),
            user_id: entry.user_id,
            action: entry.action,
            ip: entry.ip,
            user_agent: entry.user_agent,
            location: entry.location,
            occurred_at: entry.occurred_at,
        };
        tables.activity_logs.push(log.clone());
        Ok(log)
    }

    async fn list(&self, user_id: Option<UserId>, limit: i64) -> AppResult<Vec<ActivityLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activity_logs
            .iter()
            .rev()
            .filter(|log| user_id.map_or(true, |user| log.user_id == Some(user)))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn user(name: &str, points: i32) -> User {
        let mut user = User::new(name.into(), format!("{}@example.com", name), "hash".into());
        user.reward_points = points;
        user
    }

    fn voucher(quantity: i32) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: VoucherId::new(0),
            name: "Gift card".into(),
            description: String::new(),
            kind: crate::models::voucher::VoucherKind::GiftCard {
                amount: Decimal::from(20),
            },
            cost: 50,
            quantity,
            status: crate::models::voucher::VoucherStatus::Active,
            valid_from: now - chrono::Duration::days(1),
            valid_till: now + chrono::Duration::days(1),
            image_file: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn claim(user_id: UserId, voucher_id: VoucherId, code: &str) -> NewUserVoucher {
        let now = Utc::now();
        NewUserVoucher {
            user_id,
            voucher_id,
            code: code.into(),
            claimed_at: now,
            valid_till: now + chrono::Duration::days(30),
        }
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let store = MemoryStore::new();
        UserRepository::create(&store, &user("dana", 0)).await.unwrap();
        let err = UserRepository::create(&store, &user("dana", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn opening_a_transaction_replaces_the_open_one() {
        let store = MemoryStore::new();
        let owner = UserId::new(7);
        let first = store.open_for_user(owner, vec![]).await.unwrap();
        let second = store.open_for_user(owner, vec![]).await.unwrap();
        assert_ne!(first.id, second.id);
        let all = TransactionRepository::list_for_user(&store, owner).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, second.id);
    }

    #[tokio::test]
    async fn redeem_is_all_or_nothing() {
        let store = MemoryStore::new();
        let poor = UserRepository::create(&store, &user("poor", 10)).await.unwrap();
        let rich = UserRepository::create(&store, &user("rich", 100)).await.unwrap();
        let voucher = VoucherRepository::create(&store, &voucher(1)).await.unwrap();

        let outcome = store.redeem(claim(poor.id, voucher.id, "AB123"), 50).await.unwrap();
        assert!(matches!(outcome, RedemptionOutcome::InsufficientPoints));
        let untouched = VoucherRepository::find_by_id(&store, voucher.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.quantity, 1);

        let outcome = store.redeem(claim(rich.id, voucher.id, "AB123"), 50).await.unwrap();
        assert!(matches!(outcome, RedemptionOutcome::Redeemed { .. }));
        let rich = UserRepository::find_by_id(&store, rich.id).await.unwrap().unwrap();
        assert_eq!(rich.reward_points, 50);

        let outcome = store.redeem(claim(rich.id, voucher.id, "CD456"), 50).await.unwrap();
        assert!(matches!(outcome, RedemptionOutcome::SoldOut));
    }
}
