//! Per-user carts. A user owns at most one cart row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::cart::{Cart, CartItem, CartRow, NewCartItem};
use crate::types::{CartId, CartItemId, UserId};

const CART_COLUMNS: &str = "id, user_id, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, cart_id, product_id, product_size_id, quantity, price, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<Cart>>;

    /// Returns the user's cart, creating an empty one first if needed.
    async fn get_or_create(&self, user_id: UserId) -> AppResult<Cart>;

    async fn add_item(&self, cart_id: CartId, item: NewCartItem) -> AppResult<CartItem>;

    /// Sets the absolute quantity of a line; `None` when the line is gone.
    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> AppResult<Option<CartItem>>;

    async fn remove_item(&self, item_id: CartItemId) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, row: CartRow) -> AppResult<Cart> {
        let query = format!(
            "SELECT {} FROM cart_items WHERE cart_id = $1 ORDER BY id",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, CartItem>(&query)
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(row.with_items(items))
    }

    async fn touch(&self, cart_id: CartId) -> AppResult<()> {
        sqlx::query("UPDATE carts SET updated_at = $2 WHERE id = $1")
            .bind(cart_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<Cart>> {
        let query = format!("SELECT {} FROM carts WHERE user_id = $1", CART_COLUMNS);
        let row = sqlx::query_as::<_, CartRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load_items(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_or_create(&self, user_id: UserId) -> AppResult<Cart> {
        let now = Utc::now();
        // The no-op update makes RETURNING yield the existing row on conflict.
        let query = format!(
            "INSERT INTO carts (user_id, created_at, updated_at) VALUES ($1, $2, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id RETURNING {}",
            CART_COLUMNS
        );
        let row = sqlx::query_as::<_, CartRow>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        self.load_items(row).await
    }

    async fn add_item(&self, cart_id: CartId, item: NewCartItem) -> AppResult<CartItem> {
        let query = format!(
            "INSERT INTO cart_items (cart_id, product_id, product_size_id, quantity, price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ITEM_COLUMNS
        );
        let created = sqlx::query_as::<_, CartItem>(&query)
            .bind(cart_id)
            .bind(item.product_id)
            .bind(item.product_size_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        self.touch(cart_id).await?;
        Ok(created)
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> AppResult<Option<CartItem>> {
        let query = format!(
            "UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        );
        let updated = sqlx::query_as::<_, CartItem>(&query)
            .bind(item_id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(item) = &updated {
            self.touch(item.cart_id).await?;
        }
        Ok(updated)
    }

    async fn remove_item(&self, item_id: CartItemId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
