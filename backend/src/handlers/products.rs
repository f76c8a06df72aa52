use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        product::{Product, ProductPayload},
        user::{SearchQuery, User},
    },
    state::AppState,
    types::ProductId,
    validation::ValidatedJson,
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.repos.products.list(query.term()).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(load_product(&state, id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<ProductPayload>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden("Only staff may list products".into()));
    }
    let product = state
        .repos
        .products
        .create(&payload.into_product(user.id))
        .await?;
    tracing::info!(product_id = %product.id, user_id = %user.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ProductId>,
    ValidatedJson(payload): ValidatedJson<ProductPayload>,
) -> Result<Json<Product>, AppError> {
    let existing = load_product(&state, id).await?;
    if !user.can_act_for(existing.user_id) {
        return Err(AppError::Forbidden("Forbidden".into()));
    }

    let mut product = payload.into_product(existing.user_id);
    product.id = existing.id;
    product.created_at = existing.created_at;
    product.updated_at = Utc::now();
    for size in &mut product.sizes {
        size.product_id = existing.id;
    }
    Ok(Json(state.repos.products.update(&product).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    let existing = load_product(&state, id).await?;
    if !user.can_act_for(existing.user_id) {
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    state.repos.products.delete(id).await?;
    tracing::info!(product_id = %id, user_id = %user.id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_product(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    state
        .repos
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}
