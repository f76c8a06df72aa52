//! Repository tests against a real Postgres. They are skipped unless
//! `TEST_DATABASE_URL` points at a disposable database.

use std::sync::OnceLock;

use bliss_backend::{
    db::connection::create_pool,
    models::{
        cart::NewCartItem,
        transaction::NewTransactionItem,
        user::{User, UserRole},
        voucher::{NewUserVoucher, RedemptionOutcome, Voucher, VoucherKind, VoucherStatus},
    },
    repositories::{
        CartRepository, PgCartRepository, PgTransactionRepository, PgUserRepository,
        PgVoucherRepository, TransactionRepository, UserRepository, VoucherRepository,
    },
    types::{ProductId, VoucherId},
};
use chrono::{Duration, Utc};
use sqlx::{Executor, PgPool};
use tokio::sync::Mutex;

async fn integration_guard() -> tokio::sync::MutexGuard<'static, ()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(())).lock().await
}

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping Postgres repository test");
        return None;
    };
    let pool = create_pool(&url).await.expect("connect test database");
    pool.execute(
        "TRUNCATE activity_logs, chats, support_tickets, homepage_products, homepages, \
         wishlist_products, wishlists, user_vouchers, vouchers, transaction_items, \
         transactions, cart_items, carts, product_sizes, products, users \
         RESTART IDENTITY CASCADE",
    )
    .await
    .expect("truncate tables");
    Some(pool)
}

async fn seed_user(pool: &PgPool, username: &str, points: i32) -> User {
    let mut user = User::new(
        username.to_string(),
        format!("{}@example.com", username),
        "argon2-hash".to_string(),
    );
    user.role = UserRole::Client;
    user.reward_points = points;
    PgUserRepository::new(pool.clone())
        .create(&user)
        .await
        .expect("create user")
}

fn voucher(quantity: i32, cost: i32) -> Voucher {
    let now = Utc::now();
    Voucher {
        id: VoucherId::new(0),
        name: "Gift".into(),
        description: String::new(),
        kind: VoucherKind::GiftCard {
            amount: "15".parse().unwrap(),
        },
        cost,
        quantity,
        status: VoucherStatus::Active,
        valid_from: now - Duration::days(1),
        valid_till: now + Duration::days(1),
        image_file: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn user_history_and_reset_token_round_trip() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else {
        return;
    };
    let repo = PgUserRepository::new(pool.clone());
    let mut user = seed_user(&pool, "persisted", 0).await;

    user.password_history = vec!["old-1".into(), "old-2".into()];
    user.password_reset_token = Some("digest".into());
    user.password_reset_expires_at = Some(Utc::now() + Duration::minutes(30));
    repo.update(&user).await.expect("update user");

    let found = repo
        .find_by_reset_token("digest")
        .await
        .expect("lookup token")
        .expect("user by token");
    assert_eq!(found.id, user.id);
    assert_eq!(found.password_history, vec!["old-1", "old-2"]);

    let duplicate = User::new(
        "persisted".into(),
        "other@example.com".into(),
        "hash".into(),
    );
    assert!(repo.create(&duplicate).await.is_err());
}

#[tokio::test]
async fn redemption_decrements_deducts_and_guards_the_last_unit() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else {
        return;
    };
    let vouchers = PgVoucherRepository::new(pool.clone());
    let users = PgUserRepository::new(pool.clone());
    let user = seed_user(&pool, "redeemer", 30).await;
    let created = vouchers.create(&voucher(1, 20)).await.expect("voucher");
    let now = Utc::now();
    let claim = |code: &str| NewUserVoucher {
        user_id: user.id,
        voucher_id: created.id,
        code: code.to_string(),
        claimed_at: now,
        valid_till: now + Duration::days(30),
    };

    match vouchers.redeem(claim("AB123"), 20).await.expect("redeem") {
        RedemptionOutcome::Redeemed { voucher, claim } => {
            assert_eq!(voucher.quantity, 0);
            assert_eq!(voucher.status, VoucherStatus::Redeemed);
            assert_eq!(claim.code, "AB123");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let after = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(after.reward_points, 10);
    assert!(vouchers.code_exists("AB123").await.unwrap());

    assert!(matches!(
        vouchers.redeem(claim("CD456"), 20).await.expect("redeem"),
        RedemptionOutcome::SoldOut
    ));
    let after = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(after.reward_points, 10);
}

#[tokio::test]
async fn opening_a_transaction_replaces_the_previous_open_one() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = seed_user(&pool, "shopper", 0).await;
    let product_id: (i64,) = sqlx::query_as(
        "INSERT INTO products (name, description, price, product_type, user_id, created_at, updated_at) \
         VALUES ('Serum', '', 10, 'serum', $1, NOW(), NOW()) RETURNING id",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .expect("insert product");
    let product_id = ProductId::new(product_id.0);

    let carts = PgCartRepository::new(pool.clone());
    let cart = carts.get_or_create(user.id).await.expect("cart");
    carts
        .add_item(
            cart.id,
            NewCartItem {
                product_id,
                product_size_id: None,
                quantity: 1,
                price: "10".parse().unwrap(),
            },
        )
        .await
        .expect("cart item");

    let transactions = PgTransactionRepository::new(pool.clone());
    let item = || NewTransactionItem {
        product_id,
        product_size_id: None,
        product_name: "Serum".into(),
        quantity: 1,
        price: "10".parse().unwrap(),
    };
    let first = transactions
        .open_for_user(user.id, vec![item()])
        .await
        .expect("first open");
    let second = transactions
        .open_for_user(user.id, vec![item()])
        .await
        .expect("second open");
    assert_ne!(first.id, second.id);
    assert_eq!(transactions.list_for_user(user.id).await.unwrap().len(), 1);

    let finalized = transactions
        .finalize(second.id, user.id)
        .await
        .expect("finalize")
        .expect("open transaction");
    assert!(finalized.is_finalized);
    assert!(carts.find_by_user(user.id).await.unwrap().is_none());
    assert!(transactions.find_open(user.id).await.unwrap().is_none());

    transactions
        .open_for_user(user.id, vec![item()])
        .await
        .expect("reopen");
    assert!(transactions.discard_open(user.id).await.unwrap());
    assert!(!transactions.discard_open(user.id).await.unwrap());
    assert!(transactions.find_open(user.id).await.unwrap().is_none());
    let history = transactions.list_for_user(user.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_finalized);
}
