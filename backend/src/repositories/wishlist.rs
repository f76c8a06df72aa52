use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::wishlist::{Wishlist, WishlistRow};
use crate::repositories::common::like_pattern;
use crate::types::{ProductId, UserId, WishlistId};

const TABLE_NAME: &str = "wishlists";
const SELECT_COLUMNS: &str = "id, user_id, name, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn list_for_user(
        &self,
        user_id: UserId,
        search: Option<String>,
    ) -> AppResult<Vec<Wishlist>>;

    async fn find_by_id(&self, id: WishlistId) -> AppResult<Option<Wishlist>>;

    async fn create(&self, wishlist: &Wishlist) -> AppResult<Wishlist>;

    /// Renames the list and replaces its product set.
    async fn update(&self, wishlist: &Wishlist) -> AppResult<Wishlist>;

    async fn delete(&self, id: WishlistId) -> AppResult<bool>;

    /// Adds a product; adding one that is already listed is a no-op.
    async fn add_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<()>;

    async fn remove_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct PgWishlistRepository {
    pool: PgPool,
}

impl PgWishlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_products(&self, rows: Vec<WishlistRow>) -> AppResult<Vec<Wishlist>> {
        let ids: Vec<WishlistId> = rows.iter().map(|row| row.id).collect();
        let links: Vec<(WishlistId, ProductId)> = sqlx::query_as(
            "SELECT wishlist_id, product_id FROM wishlist_products \
             WHERE wishlist_id = ANY($1) ORDER BY added_at, product_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let products = links
                    .iter()
                    .filter(|(wishlist_id, _)| *wishlist_id == row.id)
                    .map(|(_, product_id)| *product_id)
                    .collect();
                row.with_products(products)
            })
            .collect())
    }

    async fn replace_products(
        tx: &mut sqlx::PgConnection,
        id: WishlistId,
        product_ids: &[ProductId],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM wishlist_products WHERE wishlist_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for product_id in product_ids {
            sqlx::query(
                "INSERT INTO wishlist_products (wishlist_id, product_id, added_at) \
                 VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(*product_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl WishlistRepository for PgWishlistRepository {
    async fn list_for_user(
        &self,
        user_id: UserId,
        search: Option<String>,
    ) -> AppResult<Vec<Wishlist>> {
        let query = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND ($2::TEXT IS NULL OR name ILIKE $2) \
             ORDER BY id",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, WishlistRow>(&query)
            .bind(user_id)
            .bind(search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;
        self.attach_products(rows).await
    }

    async fn find_by_id(&self, id: WishlistId) -> AppResult<Option<Wishlist>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let row = sqlx::query_as::<_, WishlistRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.attach_products(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, wishlist: &Wishlist) -> AppResult<Wishlist> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO {} (user_id, name, created_at, updated_at) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, WishlistRow>(&query)
            .bind(wishlist.user_id)
            .bind(&wishlist.name)
            .bind(wishlist.created_at)
            .bind(wishlist.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        Self::replace_products(&mut tx, row.id, &wishlist.product_ids).await?;
        tx.commit().await?;
        Ok(row.with_products(wishlist.product_ids.clone()))
    }

    async fn update(&self, wishlist: &Wishlist) -> AppResult<Wishlist> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE {} SET name = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, WishlistRow>(&query)
            .bind(wishlist.id)
            .bind(&wishlist.name)
            .bind(wishlist.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        Self::replace_products(&mut tx, row.id, &wishlist.product_ids).await?;
        tx.commit().await?;
        Ok(row.with_products(wishlist.product_ids.clone()))
    }

    async fn delete(&self, id: WishlistId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO wishlist_products (wishlist_id, product_id, added_at) \
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(product_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_product(&self, id: WishlistId, product_id: ProductId) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM wishlist_products WHERE wishlist_id = $1 AND product_id = $2")
                .bind(id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
