//! Checkout transactions: immutable snapshots of a cart at purchase time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{ProductId, ProductSizeId, TransactionId, TransactionItemId, UserId};
use crate::validation::rules::{validate_card_expiry, validate_card_number, validate_not_blank};

/// Lifecycle of a user's checkout: `NoTransaction -> Open -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Open,
    Finalized,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub items: Vec<TransactionItem>,
    pub shipping_address: Option<String>,
    pub delivery_time: Option<String>,
    pub payment_method: Option<String>,
    pub card_holder: Option<String>,
    /// Data-protection envelope, never the plain card number.
    pub card_number_encrypted: Option<String>,
    pub card_last4: Option<String>,
    pub card_expiry: Option<String>,
    pub is_finalized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub user_id: UserId,
    pub shipping_address: Option<String>,
    pub delivery_time: Option<String>,
    pub payment_method: Option<String>,
    pub card_holder: Option<String>,
    pub card_number_encrypted: Option<String>,
    pub card_last4: Option<String>,
    pub card_expiry: Option<String>,
    pub is_finalized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    pub fn with_items(self, items: Vec<TransactionItem>) -> Transaction {
        Transaction {
            id: self.id,
            user_id: self.user_id,
            items,
            shipping_address: self.shipping_address,
            delivery_time: self.delivery_time,
            payment_method: self.payment_method,
            card_holder: self.card_holder,
            card_number_encrypted: self.card_number_encrypted,
            card_last4: self.card_last4,
            card_expiry: self.card_expiry,
            is_finalized: self.is_finalized,
            created_at: self.created_at,
            updated_at: self.updated_at,
            finalized_at: self.finalized_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TransactionItem {
    pub id: TransactionItemId,
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub product_size_id: Option<ProductSizeId>,
    pub product_name: String,
    pub quantity: i32,
    /// Unit price at the moment the transaction was opened.
    pub price: Decimal,
}

/// Item snapshot used when opening a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionItem {
    pub product_id: ProductId,
    pub product_size_id: Option<ProductSizeId>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Shipping and payment fields written by the update step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    pub shipping_address: String,
    pub delivery_time: Option<String>,
    pub payment_method: String,
    pub card_holder: String,
    pub card_number_encrypted: String,
    pub card_last4: String,
    pub card_expiry: String,
}

impl Transaction {
    pub fn state(&self) -> TransactionState {
        if self.is_finalized {
            TransactionState::Finalized
        } else {
            TransactionState::Open
        }
    }

    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTransactionRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 500))]
    pub shipping_address: String,
    /// Preferred delivery slot, free text such as "Weekdays 9am-12pm".
    #[serde(default)]
    #[validate(length(max = 100))]
    pub delivery_time: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub payment_method: String,
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub card_holder: String,
    #[validate(custom(function = "validate_card_number"))]
    pub card_number: String,
    #[validate(custom(function = "validate_card_expiry"))]
    pub card_expiry: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub state: TransactionState,
    pub items: Vec<TransactionItem>,
    pub total: Decimal,
    pub shipping_address: Option<String>,
    pub delivery_time: Option<String>,
    pub payment_method: Option<String>,
    pub card_holder: Option<String>,
    /// Masked card number, e.g. `**** **** **** 1111`.
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub is_finalized: bool,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        let total = transaction.total();
        let state = transaction.state();
        Self {
            id: transaction.id,
            user_id: transaction.user_id,
            state,
            items: transaction.items,
            total,
            shipping_address: transaction.shipping_address,
            delivery_time: transaction.delivery_time,
            payment_method: transaction.payment_method,
            card_holder: transaction.card_holder,
            card_number: transaction
                .card_last4
                .map(|last4| format!("**** **** **** {}", last4)),
            card_expiry: transaction.card_expiry,
            is_finalized: transaction.is_finalized,
            created_at: transaction.created_at,
            finalized_at: transaction.finalized_at,
        }
    }
}
