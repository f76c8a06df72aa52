use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{ProductId, UserId, WishlistId};
use crate::validation::rules::validate_not_blank;

/// Named collection of products owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Wishlist {
    pub id: WishlistId,
    pub user_id: UserId,
    pub name: String,
    pub product_ids: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WishlistRow {
    pub id: WishlistId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WishlistRow {
    pub fn with_products(self, product_ids: Vec<ProductId>) -> Wishlist {
        Wishlist {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            product_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Wishlist {
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct WishlistPayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub name: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WishlistProductRequest {
    pub product_id: ProductId,
}
