//! Reward vouchers bought with reward points, and the per-user claims they produce.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::types::{UserId, UserVoucherId, VoucherId};
use crate::validation::rules::{validate_money, validate_not_blank};

/// What a voucher grants once claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoucherKind {
    /// A free catalogue item.
    Item { item_name: String },
    /// Percentage off an order.
    Discount { percent: Decimal },
    /// Store credit.
    GiftCard { amount: Decimal },
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::Item { .. } => "item",
            VoucherKind::Discount { .. } => "discount",
            VoucherKind::GiftCard { .. } => "gift_card",
        }
    }

    /// Numeric value column; items carry none.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            VoucherKind::Item { .. } => None,
            VoucherKind::Discount { percent } => Some(*percent),
            VoucherKind::GiftCard { amount } => Some(*amount),
        }
    }

    pub fn item_name(&self) -> Option<&str> {
        match self {
            VoucherKind::Item { item_name } => Some(item_name),
            _ => None,
        }
    }

    /// Rebuilds the kind from its flattened columns.
    pub fn from_columns(
        kind: &str,
        value: Option<Decimal>,
        item_name: Option<String>,
    ) -> Option<Self> {
        match kind {
            "item" => item_name.map(|item_name| VoucherKind::Item { item_name }),
            "discount" => value.map(|percent| VoucherKind::Discount { percent }),
            "gift_card" => value.map(|amount| VoucherKind::GiftCard { amount }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    Active,
    Redeemed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Voucher {
    pub id: VoucherId,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: VoucherKind,
    /// Price in reward points.
    pub cost: i32,
    /// Units left to claim.
    pub quantity: i32,
    pub status: VoucherStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_till: DateTime<Utc>,
    pub image_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct VoucherRow {
    pub id: VoucherId,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub value: Option<Decimal>,
    pub item_name: Option<String>,
    pub cost: i32,
    pub quantity: i32,
    pub status: VoucherStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_till: DateTime<Utc>,
    pub image_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<VoucherRow> for Voucher {
    type Error = anyhow::Error;

    fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
        let kind = VoucherKind::from_columns(&row.kind, row.value, row.item_name)
            .ok_or_else(|| anyhow::anyhow!("voucher {} has malformed kind '{}'", row.id, row.kind))?;
        Ok(Voucher {
            id: row.id,
            name: row.name,
            description: row.description,
            kind,
            cost: row.cost,
            quantity: row.quantity,
            status: row.status,
            valid_from: row.valid_from,
            valid_till: row.valid_till,
            image_file: row.image_file,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Why a voucher cannot be redeemed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionBlock {
    SoldOut,
    NotYetValid,
    Expired,
}

impl RedemptionBlock {
    pub fn message(&self) -> &'static str {
        match self {
            RedemptionBlock::SoldOut => "Voucher is fully redeemed",
            RedemptionBlock::NotYetValid => "Voucher is not yet valid",
            RedemptionBlock::Expired => "Voucher has expired",
        }
    }
}

impl Voucher {
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), RedemptionBlock> {
        if self.quantity <= 0 {
            return Err(RedemptionBlock::SoldOut);
        }
        if now < self.valid_from {
            return Err(RedemptionBlock::NotYetValid);
        }
        if now > self.valid_till {
            return Err(RedemptionBlock::Expired);
        }
        Ok(())
    }

    /// Quantity and status after one unit is claimed.
    pub fn after_redemption(&self) -> (i32, VoucherStatus) {
        let remaining = (self.quantity - 1).max(0);
        let status = if remaining == 0 {
            VoucherStatus::Redeemed
        } else {
            VoucherStatus::Active
        };
        (remaining, status)
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.kind.as_str().contains(&term)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VoucherPayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    #[validate(custom(function = "validate_kind"))]
    pub kind: VoucherKind,
    #[validate(range(min = 0))]
    pub cost: i32,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_till: DateTime<Utc>,
    #[serde(default)]
    pub image_file: Option<String>,
}

fn validate_kind(kind: &VoucherKind) -> Result<(), ValidationError> {
    match kind {
        VoucherKind::Item { item_name } => validate_not_blank(item_name),
        VoucherKind::Discount { percent } => {
            if *percent <= Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(ValidationError::new("discount_out_of_range"));
            }
            validate_money(percent)
        }
        VoucherKind::GiftCard { amount } => {
            if *amount <= Decimal::ZERO {
                return Err(ValidationError::new("gift_card_amount_not_positive"));
            }
            validate_money(amount)
        }
    }
}

impl VoucherPayload {
    pub fn window_is_valid(&self) -> bool {
        self.valid_from <= self.valid_till
    }

    pub fn into_voucher(self) -> Voucher {
        let now = Utc::now();
        let status = if self.quantity == 0 {
            VoucherStatus::Redeemed
        } else {
            VoucherStatus::Active
        };
        Voucher {
            id: VoucherId::new(0),
            name: self.name.trim().to_string(),
            description: self.description,
            kind: self.kind,
            cost: self.cost,
            quantity: self.quantity,
            status,
            valid_from: self.valid_from,
            valid_till: self.valid_till,
            image_file: self.image_file,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's claimed voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserVoucher {
    pub id: UserVoucherId,
    pub user_id: UserId,
    pub voucher_id: VoucherId,
    /// Two uppercase letters followed by three digits, e.g. `KQ042`.
    pub code: String,
    pub claimed_at: DateTime<Utc>,
    pub valid_till: DateTime<Utc>,
    pub is_used: bool,
}

impl UserVoucher {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_till
    }
}

/// Claim to insert on redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserVoucher {
    pub user_id: UserId,
    pub voucher_id: VoucherId,
    pub code: String,
    pub claimed_at: DateTime<Utc>,
    pub valid_till: DateTime<Utc>,
}

/// Result of the guarded redemption write.
#[derive(Debug, Clone)]
pub enum RedemptionOutcome {
    Redeemed {
        voucher: Voucher,
        claim: UserVoucher,
    },
    SoldOut,
    InsufficientPoints,
    CodeTaken,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionResponse {
    pub voucher: Voucher,
    pub user_voucher: UserVoucher,
    pub remaining_points: i32,
}
