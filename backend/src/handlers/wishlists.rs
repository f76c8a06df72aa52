use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        user::{SearchQuery, User},
        wishlist::{Wishlist, WishlistPayload, WishlistProductRequest},
    },
    state::AppState,
    types::{ProductId, WishlistId},
    validation::ValidatedJson,
};

pub async fn list_wishlists(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Wishlist>>, AppError> {
    Ok(Json(
        state
            .repos
            .wishlists
            .list_for_user(user.id, query.term())
            .await?,
    ))
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<WishlistId>,
) -> Result<Json<Wishlist>, AppError> {
    Ok(Json(owned_wishlist(&state, &user, id).await?))
}

pub async fn create_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<WishlistPayload>,
) -> Result<(StatusCode, Json<Wishlist>), AppError> {
    let product_ids = existing_products(&state, payload.product_ids).await?;
    let now = Utc::now();
    let wishlist = Wishlist {
        id: WishlistId::new(0),
        user_id: user.id,
        name: payload.name.trim().to_string(),
        product_ids,
        created_at: now,
        updated_at: now,
    };
    let created = state.repos.wishlists.create(&wishlist).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<WishlistId>,
    ValidatedJson(payload): ValidatedJson<WishlistPayload>,
) -> Result<Json<Wishlist>, AppError> {
    let mut wishlist = owned_wishlist(&state, &user, id).await?;
    wishlist.name = payload.name.trim().to_string();
    wishlist.product_ids = existing_products(&state, payload.product_ids).await?;
    wishlist.updated_at = Utc::now();
    Ok(Json(state.repos.wishlists.update(&wishlist).await?))
}

pub async fn delete_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<WishlistId>,
) -> Result<StatusCode, AppError> {
    owned_wishlist(&state, &user, id).await?;
    state.repos.wishlists.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_wishlist_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<WishlistId>,
    Json(payload): Json<WishlistProductRequest>,
) -> Result<Json<Wishlist>, AppError> {
    owned_wishlist(&state, &user, id).await?;
    existing_products(&state, vec![payload.product_id]).await?;
    state
        .repos
        .wishlists
        .add_product(id, payload.product_id)
        .await?;
    Ok(Json(owned_wishlist(&state, &user, id).await?))
}

pub async fn remove_wishlist_product(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, product_id)): Path<(WishlistId, ProductId)>,
) -> Result<Json<Wishlist>, AppError> {
    owned_wishlist(&state, &user, id).await?;
    if !state.repos.wishlists.remove_product(id, product_id).await? {
        return Err(AppError::NotFound("Product is not in this wishlist".into()));
    }
    Ok(Json(owned_wishlist(&state, &user, id).await?))
}

async fn owned_wishlist(
    state: &AppState,
    user: &User,
    id: WishlistId,
) -> Result<Wishlist, AppError> {
    let wishlist = state
        .repos
        .wishlists
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Wishlist not found".into()))?;
    if !user.can_act_for(wishlist.user_id) {
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    Ok(wishlist)
}

/// Deduplicated ids, all of which must name an existing product.
async fn existing_products(
    state: &AppState,
    product_ids: Vec<ProductId>,
) -> Result<Vec<ProductId>, AppError> {
    let mut unique = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        if unique.contains(&product_id) {
            continue;
        }
        if state.repos.products.find_by_id(product_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product {} not found", product_id)));
        }
        unique.push(product_id);
    }
    Ok(unique)
}
