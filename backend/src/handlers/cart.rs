use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        cart::{AddCartItemRequest, CartResponse, UpdateCartItemRequest},
        user::User,
    },
    state::AppState,
    types::CartItemId,
    validation::ValidatedJson,
};

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts().get_cart(user.id).await?;
    Ok(Json(cart.into()))
}

pub async fn add_cart_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<AddCartItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state
        .carts()
        .add_item(
            user.id,
            payload.product_id,
            payload.product_size_id,
            payload.quantity,
        )
        .await?;
    Ok(Json(cart.into()))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(item_id): Path<CartItemId>,
    ValidatedJson(payload): ValidatedJson<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state
        .carts()
        .update_item(user.id, item_id, payload.quantity)
        .await?;
    Ok(Json(cart.into()))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts().remove_item(user.id, item_id).await?;
    Ok(Json(cart.into()))
}
