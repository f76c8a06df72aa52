//! User accounts, including the security columns (lockout, reset token,
//! password history) that only the account service writes.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::user::User;
use crate::repositories::common::like_pattern;
use crate::types::UserId;

const TABLE_NAME: &str = "users";
const SELECT_COLUMNS: &str = "id, username, email, password_hash, role, reward_points, \
     two_factor_secret, two_factor_enabled, failed_login_attempts, lockout_end, \
     password_reset_token, password_reset_expires_at, password_history, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by id, optionally filtered by username/email substring.
    async fn list(&self, search: Option<String>) -> AppResult<Vec<User>>;

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Looks up the account holding the given reset-token digest.
    async fn find_by_reset_token(&self, token_digest: &str) -> AppResult<Option<User>>;

    /// Inserts the user; fails with `Conflict` on a duplicate username or email.
    async fn create(&self, user: &User) -> AppResult<User>;

    /// Writes every mutable column of `user`.
    async fn update(&self, user: &User) -> AppResult<User>;

    /// Returns `false` when no such user existed.
    async fn delete(&self, id: UserId) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            SELECT_COLUMNS, TABLE_NAME, column
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self, search: Option<String>) -> AppResult<Vec<User>> {
        let users = match search {
            Some(term) => {
                let query = format!(
                    "SELECT {} FROM {} WHERE username ILIKE $1 OR email ILIKE $1 ORDER BY id",
                    SELECT_COLUMNS, TABLE_NAME
                );
                sqlx::query_as::<_, User>(&query)
                    .bind(like_pattern(&term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM {} ORDER BY id", SELECT_COLUMNS, TABLE_NAME);
                sqlx::query_as::<_, User>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(users)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_reset_token(&self, token_digest: &str) -> AppResult<Option<User>> {
        self.find_one("password_reset_token", token_digest).await
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let query = format!(
            "INSERT INTO {} (username, email, password_hash, role, reward_points, \
             two_factor_secret, two_factor_enabled, password_history, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.reward_points)
            .bind(&user.two_factor_secret)
            .bind(user.two_factor_enabled)
            .bind(&user.password_history)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let query = format!(
            "UPDATE {} SET username = $2, email = $3, password_hash = $4, role = $5, \
             reward_points = $6, two_factor_secret = $7, two_factor_enabled = $8, \
             failed_login_attempts = $9, lockout_end = $10, password_reset_token = $11, \
             password_reset_expires_at = $12, password_history = $13, updated_at = $14 \
             WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let updated = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.reward_points)
            .bind(&user.two_factor_secret)
            .bind(user.two_factor_enabled)
            .bind(user.failed_login_attempts)
            .bind(user.lockout_end)
            .bind(&user.password_reset_token)
            .bind(user.password_reset_expires_at)
            .bind(&user.password_history)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
