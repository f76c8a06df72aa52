//! Account lifecycle: registration, credential checks with lockout and TOTP,
//! password changes with reuse history, and token based password reset.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::user::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        UpdateUserRequest, User, UserResponse,
    },
    repositories::UserRepository,
    services::mailer::{password_reset_url, Mailer},
    types::UserId,
    utils::{
        jwt::create_access_token,
        mfa::verify_totp_code,
        password::{hash_password, matches_any, push_history, verify_password},
        security::{digest_token, generate_reset_token},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken".into()));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(&User::new(username, email, password_hash))
            .await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        self.issue_token(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let identifier = request.username.trim();
        let found = if identifier.contains('@') {
            self.users.find_by_email(&identifier.to_lowercase()).await?
        } else {
            self.users.find_by_username(identifier).await?
        };
        let mut user = found.ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        let now = Utc::now();
        if user.is_locked_out(now) {
            tracing::warn!(user_id = %user.id, "login refused for locked account");
            return Err(AppError::Unauthorized("Account is locked".into()));
        }

        if !verify_password(&request.password, &user.password_hash)? {
            self.record_failed_attempt(&mut user).await?;
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        if user.two_factor_enabled {
            let secret = user.two_factor_secret.clone().ok_or_else(|| {
                AppError::InternalServerError(anyhow::anyhow!(
                    "user {} has 2FA enabled without a secret",
                    user.id
                ))
            })?;
            let code = request
                .totp_code
                .as_deref()
                .ok_or_else(|| AppError::Unauthorized("Two-factor code required".into()))?;
            if !verify_totp_code(&secret, code)? {
                self.record_failed_attempt(&mut user).await?;
                return Err(AppError::Unauthorized("Invalid two-factor code".into()));
            }
        }

        if user.failed_login_attempts != 0 || user.lockout_end.is_some() {
            user.failed_login_attempts = 0;
            user.lockout_end = None;
            user.updated_at = now;
            user = self.users.update(&user).await?;
        }
        tracing::info!(user_id = %user.id, "user logged in");
        self.issue_token(user)
    }

    pub async fn change_password(
        &self,
        user_id: UserId,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        let mut user = self.load(user_id).await?;
        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Current password is incorrect".into()));
        }
        self.apply_new_password(&mut user, &request.new_password)?;
        self.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Issues a reset token for a known address. Unknown addresses succeed
    /// silently.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_reset_token();
        let now = Utc::now();
        user.password_reset_token = Some(digest_token(&token));
        user.password_reset_expires_at =
            Some(now + Duration::minutes(self.config.password_reset_token_ttl_minutes));
        user.updated_at = now;
        let user = self.users.update(&user).await?;

        let reset_url = password_reset_url(&self.config.frontend_url, &token);
        if let Err(err) = self.mailer.send_password_reset(&user.email, &reset_url).await {
            tracing::error!(error = ?err, user_id = %user.id, "failed to send password reset mail");
        }
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        let invalid = || AppError::BadRequest("Invalid or expired reset token".into());
        let mut user = self
            .users
            .find_by_reset_token(&digest_token(&request.token))
            .await?
            .ok_or_else(invalid)?;
        let now = Utc::now();
        if user.password_reset_expires_at.map_or(true, |expires| expires < now) {
            return Err(invalid());
        }

        self.apply_new_password(&mut user, &request.new_password)?;
        user.password_reset_token = None;
        user.password_reset_expires_at = None;
        user.failed_login_attempts = 0;
        user.lockout_end = None;
        self.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    pub async fn get(&self, actor: &User, id: UserId) -> AppResult<User> {
        if !actor.can_act_for(id) {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        self.load(id).await
    }

    pub async fn list(&self, actor: &User, search: Option<String>) -> AppResult<Vec<User>> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        self.users.list(search).await
    }

    /// Profile edits by the user themself or an admin. Role and reward
    /// points are admin-only.
    pub async fn update(
        &self,
        actor: &User,
        id: UserId,
        request: UpdateUserRequest,
    ) -> AppResult<User> {
        if !actor.can_act_for(id) {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        if (request.role.is_some() || request.reward_points.is_some()) && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins may change roles or reward points".into(),
            ));
        }

        let mut user = self.load(id).await?;
        if let Some(username) = request.username {
            let username = username.trim().to_string();
            if username != user.username {
                if self.users.find_by_username(&username).await?.is_some() {
                    return Err(AppError::Conflict("Username is already taken".into()));
                }
                user.username = username;
            }
        }
        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            if email != user.email {
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(AppError::Conflict("Email is already registered".into()));
                }
                user.email = email;
            }
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(points) = request.reward_points {
            user.reward_points = points;
        }
        user.updated_at = Utc::now();
        self.users.update(&user).await
    }

    pub async fn delete(&self, actor: &User, id: UserId) -> AppResult<()> {
        if !actor.can_act_for(id) {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User not found".into()));
        }
        tracing::info!(user_id = %id, actor_id = %actor.id, "user deleted");
        Ok(())
    }

    async fn load(&self, id: UserId) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Rejects the current password and retained history, then rotates the
    /// current hash into the history.
    fn apply_new_password(&self, user: &mut User, new_password: &str) -> AppResult<()> {
        if verify_password(new_password, &user.password_hash)?
            || matches_any(new_password, &user.password_history)?
        {
            return Err(AppError::BadRequest(
                "New password must not match a recently used password".into(),
            ));
        }
        let new_hash = hash_password(new_password)?;
        let previous = std::mem::replace(&mut user.password_hash, new_hash);
        push_history(
            &mut user.password_history,
            previous,
            self.config.password_history_count,
        );
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn record_failed_attempt(&self, user: &mut User) -> AppResult<()> {
        let now = Utc::now();
        user.failed_login_attempts += 1;
        if user.failed_login_attempts >= self.config.account_lockout_threshold {
            user.lockout_end =
                Some(now + Duration::minutes(self.config.account_lockout_duration_minutes));
            user.failed_login_attempts = 0;
            tracing::warn!(user_id = %user.id, "account locked after repeated failed logins");
        }
        user.updated_at = now;
        *user = self.users.update(user).await?;
        Ok(())
    }

    fn issue_token(&self, user: User) -> AppResult<AuthResponse> {
        let token =
            create_access_token(&user, &self.config.jwt_secret, self.config.jwt_expiry_days)?;
        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }
}
