use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::cart::{Cart, NewCartItem},
    repositories::{CartRepository, ProductRepository},
    types::{CartItemId, ProductId, ProductSizeId, UserId},
};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { carts, products }
    }

    pub async fn get_cart(&self, user_id: UserId) -> AppResult<Cart> {
        self.carts.get_or_create(user_id).await
    }

    /// Adds units of a product (or one of its sizes). An existing line for the
    /// same product/size is incremented instead of duplicated.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size_id: Option<ProductSizeId>,
        quantity: i32,
    ) -> AppResult<Cart> {
        if quantity < 1 {
            return Err(AppError::BadRequest("Quantity must be at least 1".into()));
        }
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
        let price = product.unit_price(size_id).ok_or_else(|| {
            AppError::BadRequest("Size does not belong to this product".into())
        })?;

        let cart = self.carts.get_or_create(user_id).await?;
        match cart.find_line(product_id, size_id) {
            Some(line) => {
                let new_quantity = line.quantity.saturating_add(quantity);
                self.carts.set_item_quantity(line.id, new_quantity).await?;
            }
            None => {
                self.carts
                    .add_item(
                        cart.id,
                        NewCartItem {
                            product_id,
                            product_size_id: size_id,
                            quantity,
                            price,
                        },
                    )
                    .await?;
            }
        }
        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity, "cart item added");
        self.carts.get_or_create(user_id).await
    }

    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> AppResult<Cart> {
        if quantity < 1 {
            return Err(AppError::BadRequest("Quantity must be at least 1".into()));
        }
        self.owned_cart_with_item(user_id, item_id).await?;
        self.carts
            .set_item_quantity(item_id, quantity)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".into()))?;
        self.carts.get_or_create(user_id).await
    }

    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> AppResult<Cart> {
        self.owned_cart_with_item(user_id, item_id).await?;
        if !self.carts.remove_item(item_id).await? {
            return Err(AppError::NotFound("Cart item not found".into()));
        }
        self.carts.get_or_create(user_id).await
    }

    async fn owned_cart_with_item(&self, user_id: UserId, item_id: CartItemId) -> AppResult<Cart> {
        self.carts
            .find_by_user(user_id)
            .await?
            .filter(|cart| cart.item(item_id).is_some())
            .ok_or_else(|| AppError::NotFound("Cart item not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::{ProductPayload, ProductSizePayload};
    use crate::models::user::User;
    use crate::repositories::{MemoryStore, Repositories, UserRepository};
    use rust_decimal::Decimal;

    async fn setup() -> (CartService, UserId, ProductId, ProductSizeId) {
        let store = MemoryStore::new();
        let owner = UserRepository::create(
            &store,
            &User::new("owner".into(), "owner@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();
        let repos = Repositories::from_store(store);
        let product = repos
            .products
            .create(
                &ProductPayload {
                    name: "Cleanser".into(),
                    description: String::new(),
                    price: Decimal::from(12),
                    product_type: "Cleanser".into(),
                    image_file: None,
                    sizes: vec![ProductSizePayload {
                        size: "200ml".into(),
                        price: Decimal::from(20),
                    }],
                }
                .into_product(owner.id),
            )
            .await
            .unwrap();
        let size_id = product.sizes[0].id;
        (
            CartService::new(repos.carts.clone(), repos.products.clone()),
            owner.id,
            product.id,
            size_id,
        )
    }

    #[tokio::test]
    async fn adding_same_product_twice_increments_line() {
        let (service, user, product, _) = setup().await;
        service.add_item(user, product, None, 1).await.unwrap();
        let cart = service.add_item(user, product, None, 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].price, Decimal::from(12));
    }

    #[tokio::test]
    async fn sized_line_captures_size_price() {
        let (service, user, product, size) = setup().await;
        service.add_item(user, product, None, 1).await.unwrap();
        let cart = service.add_item(user, product, Some(size), 1).await.unwrap();
        assert_eq!(cart.items.len(), 2);
        let sized = cart.find_line(product, Some(size)).unwrap();
        assert_eq!(sized.price, Decimal::from(20));
    }

    #[tokio::test]
    async fn foreign_size_is_rejected() {
        let (service, user, product, _) = setup().await;
        let err = service
            .add_item(user, product, Some(ProductSizeId::new(999)), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let (service, user, _, _) = setup().await;
        let err = service
            .add_item(user, ProductId::new(999), None, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_users_items_are_not_found() {
        let (service, user, product, _) = setup().await;
        let cart = service.add_item(user, product, None, 1).await.unwrap();
        let item_id = cart.items[0].id;

        let err = service
            .update_item(UserId::new(999), item_id, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let cart = service.update_item(user, item_id, 5).await.unwrap();
        assert_eq!(cart.items[0].quantity, 5);
        let cart = service.remove_item(user, item_id).await.unwrap();
        assert!(cart.is_empty());
    }
}
