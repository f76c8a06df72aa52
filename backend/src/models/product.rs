//! Catalogue products and their size/price variants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{ProductId, ProductSizeId, UserId};
use crate::validation::rules::{validate_money, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub product_type: String,
    /// File name returned by the upload endpoint.
    pub image_file: Option<String>,
    /// Staff member that listed the product.
    pub user_id: UserId,
    pub sizes: Vec<ProductSize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `products` table; sizes are loaded separately.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub product_type: String,
    pub image_file: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn with_sizes(self, sizes: Vec<ProductSize>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            product_type: self.product_type,
            image_file: self.image_file,
            user_id: self.user_id,
            sizes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductSize {
    pub id: ProductSizeId,
    pub product_id: ProductId,
    /// Label such as "50ml".
    pub size: String,
    pub price: Decimal,
}

impl Product {
    pub fn size(&self, size_id: ProductSizeId) -> Option<&ProductSize> {
        self.sizes.iter().find(|size| size.id == size_id)
    }

    /// Unit price for the product, or for one of its sizes.
    pub fn unit_price(&self, size_id: Option<ProductSizeId>) -> Option<Decimal> {
        match size_id {
            Some(size_id) => self.size(size_id).map(|size| size.price),
            None => Some(self.price),
        }
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.product_type.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProductSizePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub size: String,
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
/// Create and update payload; sizes replace the existing variant list.
pub struct ProductPayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
    #[validate(custom(function = "validate_not_blank"))]
    pub product_type: String,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub sizes: Vec<ProductSizePayload>,
}

impl ProductPayload {
    /// Builds an unsaved product owned by `owner`.
    pub fn into_product(self, owner: UserId) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(0),
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            product_type: self.product_type.trim().to_string(),
            image_file: self.image_file,
            user_id: owner,
            sizes: self
                .sizes
                .into_iter()
                .map(|size| ProductSize {
                    id: ProductSizeId::new(0),
                    product_id: ProductId::new(0),
                    size: size.size.trim().to_string(),
                    price: size.price,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }
}
