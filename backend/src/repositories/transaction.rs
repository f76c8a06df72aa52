//! Checkout transactions. The multi-step writes here run inside one database
//! transaction each so no caller can observe them half done.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::transaction::{
    NewTransactionItem, Transaction, TransactionDetails, TransactionItem, TransactionRow,
};
use crate::types::{TransactionId, UserId};

const TABLE_NAME: &str = "transactions";
const SELECT_COLUMNS: &str = "id, user_id, shipping_address, delivery_time, payment_method, \
     card_holder, card_number_encrypted, card_last4, card_expiry, is_finalized, created_at, \
     updated_at, finalized_at";
const ITEM_COLUMNS: &str =
    "id, transaction_id, product_id, product_size_id, product_name, quantity, price";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// The user's unfinalized transaction, if any.
    async fn find_open(&self, user_id: UserId) -> AppResult<Option<Transaction>>;

    /// All of the user's transactions, newest first.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>>;

    /// Deletes the user's open transaction, returning whether one existed.
    async fn discard_open(&self, user_id: UserId) -> AppResult<bool>;

    /// Discards the user's open transaction (if any) and opens a new one
    /// holding `items`, in a single atomic step.
    async fn open_for_user(
        &self,
        user_id: UserId,
        items: Vec<NewTransactionItem>,
    ) -> AppResult<Transaction>;

    /// Overwrites shipping and payment fields of an open transaction.
    async fn update_details(
        &self,
        id: TransactionId,
        details: TransactionDetails,
    ) -> AppResult<Option<Transaction>>;

    /// Deletes the owner's cart and marks the transaction finalized, atomically.
    /// `None` when the transaction is missing or already finalized.
    async fn finalize(&self, id: TransactionId, user_id: UserId)
        -> AppResult<Option<Transaction>>;
}

#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_items(&self, rows: Vec<TransactionRow>) -> AppResult<Vec<Transaction>> {
        let ids: Vec<TransactionId> = rows.iter().map(|row| row.id).collect();
        let query = format!(
            "SELECT {} FROM transaction_items WHERE transaction_id = ANY($1) ORDER BY id",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, TransactionItem>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own = items
                    .iter()
                    .filter(|item| item.transaction_id == row.id)
                    .cloned()
                    .collect();
                row.with_items(own)
            })
            .collect())
    }

    async fn load(&self, row: TransactionRow) -> AppResult<Transaction> {
        let mut loaded = self.attach_items(vec![row]).await?;
        loaded
            .pop()
            .ok_or_else(|| anyhow::anyhow!("transaction lost while loading items").into())
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find_open(&self, user_id: UserId) -> AppResult<Option<Transaction>> {
        let query = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND NOT is_finalized",
            SELECT_COLUMNS, TABLE_NAME
        );
        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        let query = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_items(rows).await
    }

    async fn discard_open(&self, user_id: UserId) -> AppResult<bool> {
        let discarded = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND NOT is_finalized",
            TABLE_NAME
        ))
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(discarded > 0)
    }

    async fn open_for_user(
        &self,
        user_id: UserId,
        items: Vec<NewTransactionItem>,
    ) -> AppResult<Transaction> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let discarded = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND NOT is_finalized",
            TABLE_NAME
        ))
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if discarded > 0 {
            tracing::debug!(user_id = %user_id, "Discarded previous open transaction");
        }

        let query = format!(
            "INSERT INTO {} (user_id, is_finalized, created_at, updated_at) \
             VALUES ($1, FALSE, $2, $2) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO transaction_items (transaction_id, product_id, product_size_id, \
             product_name, quantity, price) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ITEM_COLUMNS
        );
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let inserted = sqlx::query_as::<_, TransactionItem>(&item_query)
                .bind(row.id)
                .bind(item.product_id)
                .bind(item.product_size_id)
                .bind(&item.product_name)
                .bind(item.quantity)
                .bind(item.price)
                .fetch_one(&mut *tx)
                .await?;
            created.push(inserted);
        }

        tx.commit().await?;
        Ok(row.with_items(created))
    }

    async fn update_details(
        &self,
        id: TransactionId,
        details: TransactionDetails,
    ) -> AppResult<Option<Transaction>> {
        let query = format!(
            "UPDATE {} SET shipping_address = $2, delivery_time = $3, payment_method = $4, \
             card_holder = $5, card_number_encrypted = $6, card_last4 = $7, card_expiry = $8, \
             updated_at = $9 WHERE id = $1 AND NOT is_finalized RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .bind(&details.shipping_address)
            .bind(&details.delivery_time)
            .bind(&details.payment_method)
            .bind(&details.card_holder)
            .bind(&details.card_number_encrypted)
            .bind(&details.card_last4)
            .bind(&details.card_expiry)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn finalize(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> AppResult<Option<Transaction>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "UPDATE {} SET is_finalized = TRUE, finalized_at = $3, updated_at = $3 \
             WHERE id = $1 AND user_id = $2 AND NOT is_finalized RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .bind(user_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(self.load(row).await?))
    }
}
