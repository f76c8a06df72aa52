use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::User,
        voucher::{
            NewUserVoucher, RedemptionOutcome, RedemptionResponse, UserVoucher, Voucher,
            VoucherPayload,
        },
    },
    repositories::{UserRepository, VoucherRepository},
    types::{UserVoucherId, VoucherId},
};

const CODE_LETTERS: usize = 2;
const CODE_DIGITS: usize = 3;
const MAX_CODE_ATTEMPTS: usize = 25;
/// Redemption restarts when a concurrent claim took the generated code.
const MAX_REDEEM_ATTEMPTS: usize = 3;

/// Random claim code: two uppercase letters followed by three digits.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(CODE_LETTERS + CODE_DIGITS);
    for _ in 0..CODE_LETTERS {
        code.push(char::from(rng.gen_range(b'A'..=b'Z')));
    }
    for _ in 0..CODE_DIGITS {
        code.push(char::from(rng.gen_range(b'0'..=b'9')));
    }
    code
}

#[derive(Clone)]
pub struct VoucherService {
    vouchers: Arc<dyn VoucherRepository>,
    users: Arc<dyn UserRepository>,
    claim_validity: Duration,
}

impl VoucherService {
    pub fn new(
        vouchers: Arc<dyn VoucherRepository>,
        users: Arc<dyn UserRepository>,
        claim_validity_days: i64,
    ) -> Self {
        Self {
            vouchers,
            users,
            claim_validity: Duration::days(claim_validity_days),
        }
    }

    pub async fn list(&self, search: Option<String>) -> AppResult<Vec<Voucher>> {
        self.vouchers.list(search).await
    }

    pub async fn get(&self, id: VoucherId) -> AppResult<Voucher> {
        self.vouchers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Voucher not found".into()))
    }

    pub async fn create(&self, payload: VoucherPayload) -> AppResult<Voucher> {
        ensure_window(&payload)?;
        let voucher = self.vouchers.create(&payload.into_voucher()).await?;
        tracing::info!(voucher_id = %voucher.id, kind = voucher.kind.as_str(), "voucher created");
        Ok(voucher)
    }

    pub async fn update(&self, id: VoucherId, payload: VoucherPayload) -> AppResult<Voucher> {
        ensure_window(&payload)?;
        let existing = self.get(id).await?;
        let mut voucher = payload.into_voucher();
        voucher.id = existing.id;
        voucher.created_at = existing.created_at;
        self.vouchers.update(&voucher).await
    }

    pub async fn delete(&self, id: VoucherId) -> AppResult<()> {
        if !self.vouchers.delete(id).await? {
            return Err(AppError::NotFound("Voucher not found".into()));
        }
        Ok(())
    }

    /// Spends the user's points on one unit of the voucher and issues a claim.
    pub async fn redeem(&self, user: &User, voucher_id: VoucherId) -> AppResult<RedemptionResponse> {
        let voucher = self.get(voucher_id).await?;
        let now = Utc::now();
        voucher
            .check_redeemable(now)
            .map_err(|block| AppError::BadRequest(block.message().into()))?;

        let current = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if current.reward_points < voucher.cost {
            return Err(insufficient_points());
        }

        for attempt in 1..=MAX_REDEEM_ATTEMPTS {
            let claim = NewUserVoucher {
                user_id: user.id,
                voucher_id,
                code: self.unique_code().await?,
                claimed_at: now,
                valid_till: now + self.claim_validity,
            };

            match self.vouchers.redeem(claim, voucher.cost).await? {
                RedemptionOutcome::Redeemed { voucher, claim } => {
                    let remaining_points = self
                        .users
                        .find_by_id(user.id)
                        .await?
                        .map(|user| user.reward_points)
                        .unwrap_or_default();
                    tracing::info!(
                        user_id = %user.id,
                        voucher_id = %voucher.id,
                        code = %claim.code,
                        remaining = voucher.quantity,
                        "voucher redeemed"
                    );
                    return Ok(RedemptionResponse {
                        voucher,
                        user_voucher: claim,
                        remaining_points,
                    });
                }
                RedemptionOutcome::SoldOut => {
                    return Err(AppError::BadRequest("Voucher is fully redeemed".into()))
                }
                RedemptionOutcome::InsufficientPoints => return Err(insufficient_points()),
                RedemptionOutcome::CodeTaken => {
                    tracing::warn!(voucher_id = %voucher_id, attempt, "claim code collided, retrying");
                }
            }
        }

        Err(AppError::InternalServerError(anyhow!(
            "could not allocate a unique voucher code"
        )))
    }

    pub async fn list_claims(&self, user: &User) -> AppResult<Vec<UserVoucher>> {
        self.vouchers.list_claims(user.id).await
    }

    pub async fn get_claim(&self, user: &User, id: UserVoucherId) -> AppResult<UserVoucher> {
        let claim = self
            .vouchers
            .find_claim(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User voucher not found".into()))?;
        if !user.can_act_for(claim.user_id) {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        Ok(claim)
    }

    pub async fn use_claim(&self, user: &User, id: UserVoucherId) -> AppResult<UserVoucher> {
        let claim = self.get_claim(user, id).await?;
        if claim.is_used {
            return Err(AppError::BadRequest("Voucher has already been used".into()));
        }
        if claim.is_expired(Utc::now()) {
            return Err(AppError::BadRequest("Voucher has expired".into()));
        }
        self.vouchers
            .mark_claim_used(id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Voucher has already been used".into()))
    }

    /// Draws codes until one is not already taken.
    async fn unique_code(&self) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(&mut rand::thread_rng());
            if !self.vouchers.code_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(AppError::InternalServerError(anyhow!(
            "voucher code space exhausted after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }
}

fn ensure_window(payload: &VoucherPayload) -> AppResult<()> {
    if !payload.window_is_valid() {
        return Err(AppError::BadRequest(
            "valid_from must not be after valid_till".into(),
        ));
    }
    Ok(())
}

fn insufficient_points() -> AppError {
    AppError::BadRequest("Insufficient reward points".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::voucher::{VoucherKind, VoucherStatus};
    use crate::repositories::user::MockUserRepository;
    use crate::repositories::voucher::MockVoucherRepository;
    use crate::repositories::{MemoryStore, Repositories};
    use crate::types::UserId;
    use rand::{rngs::StdRng, SeedableRng};
    use rust_decimal::Decimal;

    fn is_valid_code(code: &str) -> bool {
        let chars: Vec<char> = code.chars().collect();
        chars.len() == CODE_LETTERS + CODE_DIGITS
            && chars[..CODE_LETTERS].iter().all(char::is_ascii_uppercase)
            && chars[CODE_LETTERS..].iter().all(char::is_ascii_digit)
    }

    fn payload(quantity: i32, cost: i32) -> VoucherPayload {
        let now = Utc::now();
        VoucherPayload {
            name: "Sheet mask".into(),
            description: String::new(),
            kind: VoucherKind::Item {
                item_name: "Sheet mask".into(),
            },
            cost,
            quantity,
            valid_from: now - Duration::days(1),
            valid_till: now + Duration::days(30),
            image_file: None,
        }
    }

    async fn setup(points: i32) -> (VoucherService, User) {
        let store = MemoryStore::new();
        let mut user = User::new("buyer".into(), "buyer@example.com".into(), "hash".into());
        user.reward_points = points;
        let repos = Repositories::from_store(store);
        let user = repos.users.create(&user).await.unwrap();
        (
            VoucherService::new(repos.vouchers.clone(), repos.users.clone(), 30),
            user,
        )
    }

    #[test]
    fn generated_codes_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert!(is_valid_code(&code), "bad code {code}");
        }
        assert!(!is_valid_code("A1234"));
        assert!(!is_valid_code("ab123"));
        assert!(!is_valid_code("aé12"));
        assert!(!is_valid_code("ÉÉ123"));
    }

    #[tokio::test]
    async fn last_unit_flips_status_and_deducts_points() {
        let (service, user) = setup(120).await;
        let voucher = service.create(payload(1, 100)).await.unwrap();

        let response = service.redeem(&user, voucher.id).await.unwrap();
        assert_eq!(response.voucher.quantity, 0);
        assert_eq!(response.voucher.status, VoucherStatus::Redeemed);
        assert_eq!(response.remaining_points, 20);
        assert!(is_valid_code(&response.user_voucher.code));
        assert_eq!(
            response.user_voucher.valid_till - response.user_voucher.claimed_at,
            Duration::days(30)
        );

        let err = service.redeem(&user, voucher.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Voucher is fully redeemed"));
    }

    #[tokio::test]
    async fn insufficient_points_leave_voucher_untouched() {
        let (service, user) = setup(10).await;
        let voucher = service.create(payload(2, 100)).await.unwrap();

        let err = service.redeem(&user, voucher.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Insufficient reward points"));
        assert_eq!(service.get(voucher.id).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn expired_voucher_is_rejected() {
        let (service, user) = setup(500).await;
        let mut expired = payload(5, 10);
        expired.valid_from = Utc::now() - Duration::days(10);
        expired.valid_till = Utc::now() - Duration::days(1);
        let voucher = service.create(expired).await.unwrap();

        let err = service.redeem(&user, voucher.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Voucher has expired"));
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let (service, _) = setup(0).await;
        let mut inverted = payload(1, 1);
        inverted.valid_till = inverted.valid_from - Duration::days(1);
        assert!(matches!(
            service.create(inverted).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn exhausted_code_space_is_internal_error() {
        let now = Utc::now();
        let voucher = Voucher {
            id: VoucherId::new(1),
            name: "Gift".into(),
            description: String::new(),
            kind: VoucherKind::GiftCard {
                amount: Decimal::from(10),
            },
            cost: 0,
            quantity: 3,
            status: VoucherStatus::Active,
            valid_from: now - Duration::days(1),
            valid_till: now + Duration::days(1),
            image_file: None,
            created_at: now,
            updated_at: now,
        };
        let mut vouchers = MockVoucherRepository::new();
        vouchers
            .expect_find_by_id()
            .returning(move |_| Ok(Some(voucher.clone())));
        vouchers
            .expect_code_exists()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|_| Ok(true));
        vouchers.expect_redeem().never();

        let mut users = MockUserRepository::new();
        let user = User::new("u".into(), "u@example.com".into(), "hash".into());
        let stored = user.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let service = VoucherService::new(Arc::new(vouchers), Arc::new(users), 30);
        let err = service.redeem(&user, VoucherId::new(1)).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[tokio::test]
    async fn claims_are_private_and_single_use() {
        let (service, user) = setup(100).await;
        let voucher = service.create(payload(3, 10)).await.unwrap();
        let claim = service.redeem(&user, voucher.id).await.unwrap().user_voucher;

        let mut stranger = User::new("x".into(), "x@example.com".into(), "hash".into());
        stranger.id = UserId::new(999);
        assert!(matches!(
            service.get_claim(&stranger, claim.id).await,
            Err(AppError::Forbidden(_))
        ));

        let used = service.use_claim(&user, claim.id).await.unwrap();
        assert!(used.is_used);
        assert!(matches!(
            service.use_claim(&user, claim.id).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(service.list_claims(&user).await.unwrap().len(), 1);
    }
}
