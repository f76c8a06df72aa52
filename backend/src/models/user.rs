//! Models that represent users, authentication payloads, and role metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::UserId;
use crate::validation::rules::validate_username;

#[derive(Debug, Clone, FromRow)]
/// Database representation of a storefront account.
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique contact address, also used for password resets.
    pub email: String,
    /// Argon2 hash of the active password.
    pub password_hash: String,
    pub role: UserRole,
    /// Balance spent when redeeming vouchers.
    pub reward_points: i32,
    /// Shared secret for RFC6238 TOTP verification (base32 encoded).
    pub two_factor_secret: Option<String>,
    pub two_factor_enabled: bool,
    /// Consecutive failed logins since the last success.
    pub failed_login_attempts: i32,
    /// Logins are refused until this instant.
    pub lockout_end: Option<DateTime<Utc>>,
    /// SHA-256 digest of the outstanding password-reset token.
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    /// Hashes of previous passwords, oldest first.
    pub password_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Shopper account.
    #[default]
    Client,
    /// Store staff managing catalogue, vouchers and support.
    Staff,
    /// Full administrative access.
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Staff => "staff",
            UserRole::Admin => "admin",
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(UserRole::Client),
            "staff" => Ok(UserRole::Staff),
            "admin" => Ok(UserRole::Admin),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["client", "staff", "admin"],
            )),
        }
    }
}

impl User {
    /// Constructs an unsaved client account; the store assigns the id.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(0),
            username,
            email,
            password_hash,
            role: UserRole::Client,
            reward_points: 0,
            two_factor_secret: None,
            two_factor_enabled: false,
            failed_login_attempts: 0,
            lockout_end: None,
            password_reset_token: None,
            password_reset_expires_at: None,
            password_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Staff and admins may manage catalogue content and support tickets.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Staff | UserRole::Admin)
    }

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.map(|end| end > now).unwrap_or(false)
    }

    /// `true` when the user may act on a resource owned by `owner`.
    pub fn can_act_for(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Payload for creating a new client account.
pub struct RegisterRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// TOTP code required when 2FA is enabled.
    #[serde(default)]
    pub totp_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Only admins may change roles.
    pub role: Option<UserRole>,
    /// Only admins may adjust reward points.
    #[validate(range(min = 0))]
    pub reward_points: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring filter.
    pub search: Option<String>,
}

impl SearchQuery {
    /// Trimmed, non-empty search term.
    pub fn term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub reward_points: i32,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            reward_points: user.reward_points,
            two_factor_enabled: user.two_factor_enabled,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Bearer token returned after registration or login.
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
