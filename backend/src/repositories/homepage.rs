use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::homepage::{Homepage, HomepageRow};
use crate::repositories::common::like_pattern;
use crate::types::{HomepageId, ProductId};

const TABLE_NAME: &str = "homepages";
const SELECT_COLUMNS: &str = "id, title, description, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HomepageRepository: Send + Sync {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Homepage>>;

    async fn find_by_id(&self, id: HomepageId) -> AppResult<Option<Homepage>>;

    async fn create(&self, homepage: &Homepage) -> AppResult<Homepage>;

    async fn update(&self, homepage: &Homepage) -> AppResult<Homepage>;

    async fn delete(&self, id: HomepageId) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct PgHomepageRepository {
    pool: PgPool,
}

impl PgHomepageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_products(&self, rows: Vec<HomepageRow>) -> AppResult<Vec<Homepage>> {
        let ids: Vec<HomepageId> = rows.iter().map(|row| row.id).collect();
        let links: Vec<(HomepageId, ProductId)> = sqlx::query_as(
            "SELECT homepage_id, product_id FROM homepage_products \
             WHERE homepage_id = ANY($1) ORDER BY position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let products = links
                    .iter()
                    .filter(|(homepage_id, _)| *homepage_id == row.id)
                    .map(|(_, product_id)| *product_id)
                    .collect();
                row.with_products(products)
            })
            .collect())
    }

    async fn replace_products(
        tx: &mut sqlx::PgConnection,
        id: HomepageId,
        product_ids: &[ProductId],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM homepage_products WHERE homepage_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (position, product_id) in product_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO homepage_products (homepage_id, product_id, position) \
                 VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(*product_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl HomepageRepository for PgHomepageRepository {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Homepage>> {
        let query = format!(
            "SELECT {} FROM {} WHERE ($1::TEXT IS NULL OR title ILIKE $1 OR description ILIKE $1) \
             ORDER BY id",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, HomepageRow>(&query)
            .bind(search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;
        self.attach_products(rows).await
    }

    async fn find_by_id(&self, id: HomepageId) -> AppResult<Option<Homepage>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let row = sqlx::query_as::<_, HomepageRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.attach_products(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, homepage: &Homepage) -> AppResult<Homepage> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO {} (title, description, created_at, updated_at) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, HomepageRow>(&query)
            .bind(&homepage.title)
            .bind(&homepage.description)
            .bind(homepage.created_at)
            .bind(homepage.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        Self::replace_products(&mut tx, row.id, &homepage.product_ids).await?;
        tx.commit().await?;
        Ok(row.with_products(homepage.product_ids.clone()))
    }

    async fn update(&self, homepage: &Homepage) -> AppResult<Homepage> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE {} SET title = $2, description = $3, updated_at = $4 WHERE id = $1 \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, HomepageRow>(&query)
            .bind(homepage.id)
            .bind(&homepage.title)
            .bind(&homepage.description)
            .bind(homepage.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        Self::replace_products(&mut tx, row.id, &homepage.product_ids).await?;
        tx.commit().await?;
        Ok(row.with_products(homepage.product_ids.clone()))
    }

    async fn delete(&self, id: HomepageId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
