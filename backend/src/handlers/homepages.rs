use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        homepage::{Homepage, HomepagePayload},
        user::{SearchQuery, User},
    },
    state::AppState,
    types::{HomepageId, ProductId},
    validation::ValidatedJson,
};

pub async fn list_homepages(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Homepage>>, AppError> {
    Ok(Json(state.repos.homepages.list(query.term()).await?))
}

pub async fn get_homepage(
    State(state): State<AppState>,
    Path(id): Path<HomepageId>,
) -> Result<Json<Homepage>, AppError> {
    Ok(Json(load_homepage(&state, id).await?))
}

pub async fn create_homepage(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<HomepagePayload>,
) -> Result<(StatusCode, Json<Homepage>), AppError> {
    ensure_staff(&user)?;
    let product_ids = ordered_products(&state, payload.product_ids).await?;
    let now = Utc::now();
    let homepage = Homepage {
        id: HomepageId::new(0),
        title: payload.title.trim().to_string(),
        description: payload.description,
        product_ids,
        created_at: now,
        updated_at: now,
    };
    let created = state.repos.homepages.create(&homepage).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_homepage(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<HomepageId>,
    ValidatedJson(payload): ValidatedJson<HomepagePayload>,
) -> Result<Json<Homepage>, AppError> {
    ensure_staff(&user)?;
    let mut homepage = load_homepage(&state, id).await?;
    homepage.title = payload.title.trim().to_string();
    homepage.description = payload.description;
    homepage.product_ids = ordered_products(&state, payload.product_ids).await?;
    homepage.updated_at = Utc::now();
    Ok(Json(state.repos.homepages.update(&homepage).await?))
}

pub async fn delete_homepage(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<HomepageId>,
) -> Result<StatusCode, AppError> {
    ensure_staff(&user)?;
    if !state.repos.homepages.delete(id).await? {
        return Err(AppError::NotFound("Homepage not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_staff(user: &User) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden("Only staff may manage homepages".into()));
    }
    Ok(())
}

async fn load_homepage(state: &AppState, id: HomepageId) -> Result<Homepage, AppError> {
    state
        .repos
        .homepages
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Homepage not found".into()))
}

/// Keeps the given order, drops repeats, and requires every product to exist.
async fn ordered_products(
    state: &AppState,
    product_ids: Vec<ProductId>,
) -> Result<Vec<ProductId>, AppError> {
    let mut ordered: Vec<ProductId> = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        if ordered.contains(&product_id) {
            continue;
        }
        if state.repos.products.find_by_id(product_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product {} not found", product_id)));
        }
        ordered.push(product_id);
    }
    Ok(ordered)
}
