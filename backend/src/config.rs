use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: u64,
    /// Key material for the reversible card-number protection.
    pub data_protection_key: String,
    pub cors_allow_origins: Vec<String>,
    pub frontend_url: String,
    pub password_history_count: usize,
    pub account_lockout_threshold: i32,
    pub account_lockout_duration_minutes: i64,
    pub password_reset_token_ttl_minutes: i64,
    pub user_voucher_validity_days: i64,
}

impl Default for Config {
    /// Local development settings backed by the in-process store.
    fn default() -> Self {
        let jwt_secret = "your-secret-key-change-this-in-production".to_string();
        Config {
            database_url: MEMORY_DATABASE_URL.to_string(),
            bind_addr: "0.0.0.0:5000".to_string(),
            data_protection_key: jwt_secret.clone(),
            jwt_secret,
            jwt_expiry_days: 7,
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            frontend_url: "http://localhost:3000".to_string(),
            password_history_count: 3,
            account_lockout_threshold: 5,
            account_lockout_duration_minutes: 15,
            password_reset_token_ttl_minutes: 60,
            user_voucher_validity_days: 30,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let data_protection_key = env::var("DATA_PROTECTION_KEY").unwrap_or_else(|_| {
            tracing::warn!("DATA_PROTECTION_KEY not set, deriving card protection key from JWT_SECRET");
            jwt_secret.clone()
        });
        if data_protection_key.is_empty() {
            return Err(anyhow!("DATA_PROTECTION_KEY must not be empty"));
        }

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.cors_allow_origins);
        let frontend_url = env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url);

        Ok(Config {
            database_url,
            bind_addr,
            jwt_secret,
            jwt_expiry_days: parse_env("JWT_EXPIRY_DAYS", defaults.jwt_expiry_days),
            data_protection_key,
            cors_allow_origins,
            frontend_url,
            password_history_count: parse_env(
                "PASSWORD_HISTORY_COUNT",
                defaults.password_history_count,
            ),
            account_lockout_threshold: parse_env(
                "ACCOUNT_LOCKOUT_THRESHOLD",
                defaults.account_lockout_threshold,
            ),
            account_lockout_duration_minutes: parse_env(
                "ACCOUNT_LOCKOUT_DURATION_MINUTES",
                defaults.account_lockout_duration_minutes,
            ),
            password_reset_token_ttl_minutes: parse_env(
                "PASSWORD_RESET_TOKEN_TTL_MINUTES",
                defaults.password_reset_token_ttl_minutes,
            ),
            user_voucher_validity_days: parse_env(
                "USER_VOUCHER_VALIDITY_DAYS",
                defaults.user_voucher_validity_days,
            ),
        })
    }

    /// Returns `true` when the process should run against the in-process store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
