use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppResult,
    models::activity_log::{ActivityLog, ClientContext, NewActivityLog},
    repositories::ActivityLogRepository,
    services::geo::GeoLocator,
    types::UserId,
};

#[derive(Clone)]
pub struct ActivityLogService {
    repo: Arc<dyn ActivityLogRepository>,
    geolocator: Arc<dyn GeoLocator>,
}

impl ActivityLogService {
    pub fn new(repo: Arc<dyn ActivityLogRepository>, geolocator: Arc<dyn GeoLocator>) -> Self {
        Self { repo, geolocator }
    }

    /// Appends an entry. Runs after the primary write has committed, so
    /// failures are logged and swallowed.
    pub async fn record(&self, user_id: Option<UserId>, action: &str, client: &ClientContext) {
        let location = match client.ip.as_deref() {
            Some(ip) => match self.geolocator.locate(ip).await {
                Ok(location) => location,
                Err(err) => {
                    tracing::warn!(error = ?err, ip, "geolocation lookup failed");
                    None
                }
            },
            None => None,
        };

        let entry = NewActivityLog {
            user_id,
            action: action.to_string(),
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            location,
            occurred_at: Utc::now(),
        };

        if let Err(err) = self.repo.insert(entry).await {
            tracing::error!(error = ?err, action, user_id = ?user_id, "failed to record activity");
        }
    }

    pub async fn list(&self, user_id: Option<UserId>, limit: i64) -> AppResult<Vec<ActivityLog>> {
        self.repo.list(user_id, limit).await
    }
}
