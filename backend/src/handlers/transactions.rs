use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    models::{
        activity_log::ClientContext,
        transaction::{TransactionResponse, UpdateTransactionRequest},
        user::User,
    },
    state::AppState,
    validation::ValidatedJson,
};

pub async fn init_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let transaction = state.checkout().init(user.id).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state.checkout().update(user.id, payload).await?;
    Ok(Json(transaction.into()))
}

pub async fn finalize_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    client: ClientContext,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state.checkout().finalize(user.id).await?;
    state
        .activity()
        .record(Some(user.id), "transaction.finalize", &client)
        .await;
    Ok(Json(transaction.into()))
}

pub async fn current_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state.checkout().current(user.id).await?;
    Ok(Json(transaction.into()))
}

pub async fn transaction_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = state.checkout().history(user.id).await?;
    Ok(Json(
        transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    ))
}
