use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::activity_log::{ActivityLog, NewActivityLog};
use crate::types::UserId;

const TABLE_NAME: &str = "activity_logs";
const SELECT_COLUMNS: &str = "id, user_id, action, ip, user_agent, location, occurred_at";

/// Append-only: entries are never updated or deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn insert(&self, entry: NewActivityLog) -> AppResult<ActivityLog>;

    /// Newest first, at most `limit` rows.
    async fn list(&self, user_id: Option<UserId>, limit: i64) -> AppResult<Vec<ActivityLog>>;
}

#[derive(Debug, Clone)]
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn insert(&self, entry: NewActivityLog) -> AppResult<ActivityLog> {
        let query = format!(
            "INSERT INTO {} (user_id, action, ip, user_agent, location, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let log = sqlx::query_as::<_, ActivityLog>(&query)
            .bind(entry.user_id)
            .bind(&entry.action)
            .bind(&entry.ip)
            .bind(&entry.user_agent)
            .bind(&entry.location)
            .bind(entry.occurred_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(log)
    }

    async fn list(&self, user_id: Option<UserId>, limit: i64) -> AppResult<Vec<ActivityLog>> {
        let query = format!(
            "SELECT {} FROM {} WHERE ($1::BIGINT IS NULL OR user_id = $1) \
             ORDER BY occurred_at DESC, id DESC LIMIT $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        let logs = sqlx::query_as::<_, ActivityLog>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }
}
