use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{HomepageId, ProductId};
use crate::validation::rules::validate_not_blank;

/// Curated grouping of products shown on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Homepage {
    pub id: HomepageId,
    pub title: String,
    pub description: String,
    pub product_ids: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HomepageRow {
    pub id: HomepageId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HomepageRow {
    pub fn with_products(self, product_ids: Vec<ProductId>) -> Homepage {
        Homepage {
            id: self.id,
            title: self.title,
            description: self.description,
            product_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Homepage {
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct HomepagePayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
}
