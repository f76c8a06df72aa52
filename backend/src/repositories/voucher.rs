//! Vouchers and the user claims created by redeeming them.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::voucher::{
    NewUserVoucher, RedemptionOutcome, UserVoucher, Voucher, VoucherRow,
};
use crate::repositories::common::like_pattern;
use crate::types::{UserId, UserVoucherId, VoucherId};

const TABLE_NAME: &str = "vouchers";
const SELECT_COLUMNS: &str = "id, name, description, kind, value, item_name, cost, quantity, \
     status, valid_from, valid_till, image_file, created_at, updated_at";
const CLAIM_COLUMNS: &str = "id, user_id, voucher_id, code, claimed_at, valid_till, is_used";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Voucher>>;

    async fn find_by_id(&self, id: VoucherId) -> AppResult<Option<Voucher>>;

    async fn create(&self, voucher: &Voucher) -> AppResult<Voucher>;

    async fn update(&self, voucher: &Voucher) -> AppResult<Voucher>;

    async fn delete(&self, id: VoucherId) -> AppResult<bool>;

    /// Whether any claim already uses `code`.
    async fn code_exists(&self, code: &str) -> AppResult<bool>;

    /// Takes one unit of the voucher, charges `cost` reward points to the
    /// claiming user and stores the claim. Either all three happen or none.
    async fn redeem(&self, claim: NewUserVoucher, cost: i32) -> AppResult<RedemptionOutcome>;

    /// Claims of one user, newest first.
    async fn list_claims(&self, user_id: UserId) -> AppResult<Vec<UserVoucher>>;

    async fn find_claim(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>>;

    async fn mark_claim_used(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>>;
}

#[derive(Debug, Clone)]
pub struct PgVoucherRepository {
    pool: PgPool,
}

impl PgVoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_vouchers(rows: Vec<VoucherRow>) -> AppResult<Vec<Voucher>> {
    rows.into_iter()
        .map(|row| Voucher::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl VoucherRepository for PgVoucherRepository {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<Voucher>> {
        let rows = match search {
            Some(term) => {
                let query = format!(
                    "SELECT {} FROM {} WHERE name ILIKE $1 OR description ILIKE $1 \
                     OR kind ILIKE $1 ORDER BY id",
                    SELECT_COLUMNS, TABLE_NAME
                );
                sqlx::query_as::<_, VoucherRow>(&query)
                    .bind(like_pattern(&term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM {} ORDER BY id", SELECT_COLUMNS, TABLE_NAME);
                sqlx::query_as::<_, VoucherRow>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        into_vouchers(rows)
    }

    async fn find_by_id(&self, id: VoucherId) -> AppResult<Option<Voucher>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let row = sqlx::query_as::<_, VoucherRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Voucher::try_from).transpose()?)
    }

    async fn create(&self, voucher: &Voucher) -> AppResult<Voucher> {
        let query = format!(
            "INSERT INTO {} (name, description, kind, value, item_name, cost, quantity, status, \
             valid_from, valid_till, image_file, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, VoucherRow>(&query)
            .bind(&voucher.name)
            .bind(&voucher.description)
            .bind(voucher.kind.as_str())
            .bind(voucher.kind.value())
            .bind(voucher.kind.item_name())
            .bind(voucher.cost)
            .bind(voucher.quantity)
            .bind(voucher.status)
            .bind(voucher.valid_from)
            .bind(voucher.valid_till)
            .bind(&voucher.image_file)
            .bind(voucher.created_at)
            .bind(voucher.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(Voucher::try_from(row)?)
    }

    async fn update(&self, voucher: &Voucher) -> AppResult<Voucher> {
        let query = format!(
            "UPDATE {} SET name = $2, description = $3, kind = $4, value = $5, item_name = $6, \
             cost = $7, quantity = $8, status = $9, valid_from = $10, valid_till = $11, \
             image_file = $12, updated_at = $13 WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, VoucherRow>(&query)
            .bind(voucher.id)
            .bind(&voucher.name)
            .bind(&voucher.description)
            .bind(voucher.kind.as_str())
            .bind(voucher.kind.value())
            .bind(voucher.kind.item_name())
            .bind(voucher.cost)
            .bind(voucher.quantity)
            .bind(voucher.status)
            .bind(voucher.valid_from)
            .bind(voucher.valid_till)
            .bind(&voucher.image_file)
            .bind(voucher.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(Voucher::try_from(row)?)
    }

    async fn delete(&self, id: VoucherId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_vouchers WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn redeem(&self, claim: NewUserVoucher, cost: i32) -> AppResult<RedemptionOutcome> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "UPDATE {} SET quantity = quantity - 1, \
             status = CASE WHEN quantity - 1 = 0 THEN 'redeemed' ELSE 'active' END, \
             updated_at = $2 WHERE id = $1 AND quantity > 0 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let voucher = sqlx::query_as::<_, VoucherRow>(&query)
            .bind(claim.voucher_id)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(voucher) = voucher else {
            tx.rollback().await?;
            return Ok(RedemptionOutcome::SoldOut);
        };

        let charged = sqlx::query(
            "UPDATE users SET reward_points = reward_points - $2, updated_at = $3 \
             WHERE id = $1 AND reward_points >= $2",
        )
        .bind(claim.user_id)
        .bind(cost)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if charged == 0 {
            tx.rollback().await?;
            return Ok(RedemptionOutcome::InsufficientPoints);
        }

        let insert = format!(
            "INSERT INTO user_vouchers (user_id, voucher_id, code, claimed_at, valid_till, is_used) \
             VALUES ($1, $2, $3, $4, $5, FALSE) RETURNING {}",
            CLAIM_COLUMNS
        );
        let inserted = sqlx::query_as::<_, UserVoucher>(&insert)
            .bind(claim.user_id)
            .bind(claim.voucher_id)
            .bind(&claim.code)
            .bind(claim.claimed_at)
            .bind(claim.valid_till)
            .fetch_one(&mut *tx)
            .await;
        let claim = match inserted {
            Ok(claim) => claim,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(RedemptionOutcome::CodeTaken);
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        Ok(RedemptionOutcome::Redeemed {
            voucher: Voucher::try_from(voucher)?,
            claim,
        })
    }

    async fn list_claims(&self, user_id: UserId) -> AppResult<Vec<UserVoucher>> {
        let query = format!(
            "SELECT {} FROM user_vouchers WHERE user_id = $1 ORDER BY claimed_at DESC, id DESC",
            CLAIM_COLUMNS
        );
        let claims = sqlx::query_as::<_, UserVoucher>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(claims)
    }

    async fn find_claim(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>> {
        let query = format!("SELECT {} FROM user_vouchers WHERE id = $1", CLAIM_COLUMNS);
        let claim = sqlx::query_as::<_, UserVoucher>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(claim)
    }

    async fn mark_claim_used(&self, id: UserVoucherId) -> AppResult<Option<UserVoucher>> {
        let query = format!(
            "UPDATE user_vouchers SET is_used = TRUE WHERE id = $1 RETURNING {}",
            CLAIM_COLUMNS
        );
        let claim = sqlx::query_as::<_, UserVoucher>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(claim)
    }
}
