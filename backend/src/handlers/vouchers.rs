use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    models::{
        activity_log::ClientContext,
        user::{SearchQuery, User},
        voucher::{RedemptionResponse, UserVoucher, Voucher, VoucherPayload},
    },
    state::AppState,
    types::{UserVoucherId, VoucherId},
    validation::ValidatedJson,
};

pub async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Voucher>>, AppError> {
    Ok(Json(state.vouchers().list(query.term()).await?))
}

pub async fn get_voucher(
    State(state): State<AppState>,
    Path(id): Path<VoucherId>,
) -> Result<Json<Voucher>, AppError> {
    Ok(Json(state.vouchers().get(id).await?))
}

pub async fn create_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<VoucherPayload>,
) -> Result<(StatusCode, Json<Voucher>), AppError> {
    ensure_staff(&user)?;
    let voucher = state.vouchers().create(payload).await?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

pub async fn update_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<VoucherId>,
    ValidatedJson(payload): ValidatedJson<VoucherPayload>,
) -> Result<Json<Voucher>, AppError> {
    ensure_staff(&user)?;
    Ok(Json(state.vouchers().update(id, payload).await?))
}

pub async fn delete_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<VoucherId>,
) -> Result<StatusCode, AppError> {
    ensure_staff(&user)?;
    state.vouchers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn redeem_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<VoucherId>,
    client: ClientContext,
) -> Result<(StatusCode, Json<RedemptionResponse>), AppError> {
    let response = state.vouchers().redeem(&user, id).await?;
    state
        .activity()
        .record(Some(user.id), "voucher.redeem", &client)
        .await;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_user_vouchers(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<UserVoucher>>, AppError> {
    Ok(Json(state.vouchers().list_claims(&user).await?))
}

pub async fn get_user_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserVoucherId>,
) -> Result<Json<UserVoucher>, AppError> {
    Ok(Json(state.vouchers().get_claim(&user, id).await?))
}

pub async fn use_user_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserVoucherId>,
) -> Result<Json<UserVoucher>, AppError> {
    Ok(Json(state.vouchers().use_claim(&user, id).await?))
}

fn ensure_staff(user: &User) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden("Only staff may manage vouchers".into()));
    }
    Ok(())
}
