//! Product catalogue with size variants.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::product::{Product, ProductRow, ProductSize};
use crate::repositories::common::like_pattern;
use crate::types::ProductId;

const TABLE_NAME: &str = "products";
const SELECT_COLUMNS: &str =
    "id, name, description, price, product_type, image_file, user_id, created_at, updated_at";
const SIZE_COLUMNS: &str = "id, product_id, size, price";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Product>>;

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>>;

    async fn create(&self, product: &Product) -> AppResult<Product>;

    /// Updates the product. Sizes are matched by label: existing labels keep
    /// their id, missing labels are removed, new labels are inserted.
    async fn update(&self, product: &Product) -> AppResult<Product>;

    async fn delete(&self, id: ProductId) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_sizes(&self, rows: Vec<ProductRow>) -> AppResult<Vec<Product>> {
        let ids: Vec<ProductId> = rows.iter().map(|row| row.id).collect();
        let query = format!(
            "SELECT {} FROM product_sizes WHERE product_id = ANY($1) ORDER BY id",
            SIZE_COLUMNS
        );
        let sizes = sqlx::query_as::<_, ProductSize>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own = sizes
                    .iter()
                    .filter(|size| size.product_id == row.id)
                    .cloned()
                    .collect();
                row.with_sizes(own)
            })
            .collect())
    }

    async fn write_sizes(
        tx: &mut sqlx::PgConnection,
        product_id: ProductId,
        sizes: &[ProductSize],
    ) -> AppResult<()> {
        let labels: Vec<&str> = sizes.iter().map(|size| size.size.as_str()).collect();
        sqlx::query("DELETE FROM product_sizes WHERE product_id = $1 AND NOT (size = ANY($2))")
            .bind(product_id)
            .bind(&labels)
            .execute(&mut *tx)
            .await?;
        for size in sizes {
            sqlx::query(
                "INSERT INTO product_sizes (product_id, size, price) VALUES ($1, $2, $3) \
                 ON CONFLICT (product_id, size) DO UPDATE SET price = EXCLUDED.price",
            )
            .bind(product_id)
            .bind(&size.size)
            .bind(size.price)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Product>> {
        let rows = match search {
            Some(term) => {
                let query = format!(
                    "SELECT {} FROM {} WHERE name ILIKE $1 OR description ILIKE $1 \
                     OR product_type ILIKE $1 ORDER BY id",
                    SELECT_COLUMNS, TABLE_NAME
                );
                sqlx::query_as::<_, ProductRow>(&query)
                    .bind(like_pattern(&term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM {} ORDER BY id", SELECT_COLUMNS, TABLE_NAME);
                sqlx::query_as::<_, ProductRow>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        self.attach_sizes(rows).await
    }

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.attach_sizes(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, product: &Product) -> AppResult<Product> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO {} (name, description, price, product_type, image_file, user_id, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.product_type)
            .bind(&product.image_file)
            .bind(product.user_id)
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        Self::write_sizes(&mut tx, row.id, &product.sizes).await?;
        tx.commit().await?;

        let id = row.id;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product {} vanished after insert", id).into())
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE {} SET name = $2, description = $3, price = $4, product_type = $5, \
             image_file = $6, updated_at = $7 WHERE id = $1",
            TABLE_NAME
        );
        sqlx::query(&query)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.product_type)
            .bind(&product.image_file)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await?;
        Self::write_sizes(&mut tx, product.id, &product.sizes).await?;
        tx.commit().await?;

        self.find_by_id(product.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound.into())
    }

    async fn delete(&self, id: ProductId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
