use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::types::{ActivityLogId, UserId};

/// Append-only record of something a user did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLog {
    pub id: ActivityLogId,
    pub user_id: Option<UserId>,
    /// Dotted action name, e.g. `user.login` or `transaction.finalize`.
    pub action: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    /// Human-readable location resolved from the client address.
    pub location: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: Option<UserId>,
    pub action: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub location: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Where a request came from, as far as the proxy headers tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityLogQuery {
    pub user_id: Option<UserId>,
    /// Maximum rows returned (default 100, max 500).
    pub limit: Option<i64>,
}

impl ActivityLogQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}
