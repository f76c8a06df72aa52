//! Checkout lifecycle: a user's cart is snapshotted into an open transaction,
//! which collects shipping and payment details and is then finalized.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::transaction::{
        NewTransactionItem, Transaction, TransactionDetails, UpdateTransactionRequest,
    },
    repositories::{CartRepository, ProductRepository, TransactionRepository},
    types::UserId,
    utils::data_protection::{last_four, normalize_card_number, DataProtector},
};

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    transactions: Arc<dyn TransactionRepository>,
    protector: DataProtector,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        transactions: Arc<dyn TransactionRepository>,
        protector: DataProtector,
    ) -> Self {
        Self {
            carts,
            products,
            transactions,
            protector,
        }
    }

    /// Discards any open transaction, then snapshots the cart into a fresh
    /// one priced at the current catalogue price. The discard stands even
    /// when the cart turns out to be empty.
    pub async fn init(&self, user_id: UserId) -> AppResult<Transaction> {
        if self.transactions.discard_open(user_id).await? {
            tracing::debug!(user_id = %user_id, "discarded open transaction");
        }

        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .products
                .find_by_id(line.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Product {} is no longer available",
                        line.product_id
                    ))
                })?;
            let price = product.unit_price(line.product_size_id).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Selected size of {} is no longer available",
                    product.name
                ))
            })?;
            let product_name = match line.product_size_id.and_then(|id| product.size(id)) {
                Some(size) => format!("{} ({})", product.name, size.size),
                None => product.name.clone(),
            };
            items.push(NewTransactionItem {
                product_id: line.product_id,
                product_size_id: line.product_size_id,
                product_name,
                quantity: line.quantity,
                price,
            });
        }

        let transaction = self.transactions.open_for_user(user_id, items).await?;
        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            items = transaction.items.len(),
            "transaction opened"
        );
        Ok(transaction)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        request: UpdateTransactionRequest,
    ) -> AppResult<Transaction> {
        let open = self.require_open(user_id).await?;

        let card_number = normalize_card_number(&request.card_number);
        let card_number_encrypted = self
            .protector
            .protect(&card_number)
            .map_err(|err| AppError::InternalServerError(err.into()))?;
        let details = TransactionDetails {
            shipping_address: request.shipping_address.trim().to_string(),
            delivery_time: request
                .delivery_time
                .map(|slot| slot.trim().to_string())
                .filter(|slot| !slot.is_empty()),
            payment_method: request.payment_method.trim().to_string(),
            card_holder: request.card_holder.trim().to_string(),
            card_last4: last_four(&card_number),
            card_number_encrypted,
            card_expiry: request.card_expiry.trim().to_string(),
        };

        self.transactions
            .update_details(open.id, details)
            .await?
            .ok_or_else(no_open_transaction)
    }

    /// Closes the open transaction and clears the cart.
    pub async fn finalize(&self, user_id: UserId) -> AppResult<Transaction> {
        let open = self.require_open(user_id).await?;
        let transaction = self
            .transactions
            .finalize(open.id, user_id)
            .await?
            .ok_or_else(no_open_transaction)?;
        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            total = %transaction.total(),
            "transaction finalized"
        );
        Ok(transaction)
    }

    pub async fn current(&self, user_id: UserId) -> AppResult<Transaction> {
        self.require_open(user_id).await
    }

    pub async fn history(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        self.transactions.list_for_user(user_id).await
    }

    async fn require_open(&self, user_id: UserId) -> AppResult<Transaction> {
        self.transactions
            .find_open(user_id)
            .await?
            .ok_or_else(no_open_transaction)
    }
}

fn no_open_transaction() -> AppError {
    AppError::NotFound("No open transaction".into())
}
