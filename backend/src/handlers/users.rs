use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{
        activity_log::ClientContext,
        user::{
            AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
            RegisterRequest, ResetPasswordRequest, SearchQuery, UpdateUserRequest, User,
            UserResponse,
        },
    },
    state::AppState,
    types::UserId,
    validation::ValidatedJson,
};

pub async fn register(
    State(state): State<AppState>,
    client: ClientContext,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth = state.accounts().register(payload).await?;
    state
        .activity()
        .record(Some(auth.user.id), "user.register", &client)
        .await;
    Ok((StatusCode::CREATED, Json(auth)))
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientContext,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state.accounts().login(payload).await?;
    state
        .activity()
        .record(Some(auth.user.id), "user.login", &client)
        .await;
    Ok(Json(auth))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.accounts().list(&user, query.term()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    let found = state.accounts().get(&user, id).await?;
    Ok(Json(UserResponse::from(found)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserId>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state.accounts().update(&user, id, payload).await?;
    Ok(Json(UserResponse::from(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserId>,
    client: ClientContext,
) -> Result<StatusCode, AppError> {
    state.accounts().delete(&user, id).await?;
    let actor = (user.id != id).then_some(user.id);
    state.activity().record(actor, "user.delete", &client).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    client: ClientContext,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state.accounts().change_password(user.id, payload).await?;
    state
        .activity()
        .record(Some(user.id), "user.change_password", &client)
        .await;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state.accounts().forgot_password(&payload.email).await?;
    Ok(Json(json!({
        "message": "If the email is registered, a password reset link has been sent"
    })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    client: ClientContext,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state.accounts().reset_password(payload).await?;
    state
        .activity()
        .record(None, "user.reset_password", &client)
        .await;
    Ok(Json(json!({ "message": "Password has been reset" })))
}
