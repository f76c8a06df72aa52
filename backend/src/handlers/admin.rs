use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::activity_log::{ActivityLog, ActivityLogQuery},
    state::AppState,
};

pub async fn list_activity_logs(
    State(state): State<AppState>,
    Query(query): Query<ActivityLogQuery>,
) -> Result<Json<Vec<ActivityLog>>, AppError> {
    let logs = state.activity().list(query.user_id, query.limit()).await?;
    Ok(Json(logs))
}
