//! Per-user shopping cart and its line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{CartId, CartItemId, ProductId, ProductSizeId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CartRow {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartRow {
    pub fn with_items(self, items: Vec<CartItem>) -> Cart {
        Cart {
            id: self.id,
            user_id: self.user_id,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_size_id: Option<ProductSizeId>,
    pub quantity: i32,
    /// Unit price captured when the line was added.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Line to insert into a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub product_size_id: Option<ProductSizeId>,
    pub quantity: i32,
    pub price: Decimal,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for the given product/size combination, if present.
    pub fn find_line(
        &self,
        product_id: ProductId,
        size_id: Option<ProductSizeId>,
    ) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id && item.product_size_id == size_id)
    }

    pub fn item(&self, item_id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Sum of captured price × quantity.
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_size_id: Option<ProductSizeId>,
    /// Units to add; defaults to one.
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: Cart,
    pub subtotal: Decimal,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let subtotal = cart.subtotal();
        Self { cart, subtotal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, product: i64, size: Option<i64>, quantity: i32, price: &str) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            product_id: ProductId::new(product),
            product_size_id: size.map(ProductSizeId::new),
            quantity,
            price: price.parse().unwrap(),
            created_at: Utc::now(),
        }
    }

    fn cart(items: Vec<CartItem>) -> Cart {
        let now = Utc::now();
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            items,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn find_line_distinguishes_sizes() {
        let cart = cart(vec![item(1, 5, None, 1, "10"), item(2, 5, Some(9), 1, "12")]);
        assert_eq!(cart.find_line(ProductId::new(5), None).unwrap().id, CartItemId::new(1));
        assert_eq!(
            cart.find_line(ProductId::new(5), Some(ProductSizeId::new(9)))
                .unwrap()
                .id,
            CartItemId::new(2)
        );
        assert!(cart.find_line(ProductId::new(6), None).is_none());
    }

    #[test]
    fn subtotal_multiplies_quantity() {
        let cart = cart(vec![item(1, 5, None, 2, "10.50"), item(2, 6, None, 1, "4.25")]);
        assert_eq!(cart.subtotal(), "25.25".parse::<Decimal>().unwrap());
    }

    #[test]
    fn add_item_request_defaults_to_one_unit() {
        let request: AddCartItemRequest =
            serde_json::from_value(serde_json::json!({ "product_id": 4 })).unwrap();
        assert_eq!(request.quantity, 1);
        assert!(request.product_size_id.is_none());
    }
}
