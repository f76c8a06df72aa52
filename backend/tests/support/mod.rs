#![allow(dead_code)]
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bliss_backend::{
    app,
    config::Config,
    models::{
        product::{Product, ProductSize},
        user::{User, UserRole},
        voucher::{Voucher, VoucherKind, VoucherStatus},
    },
    repositories::{
        MemoryStore, ProductRepository, Repositories, UserRepository, VoucherRepository,
    },
    services::{geo::NoopGeoLocator, mailer::Mailer},
    state::AppState,
    types::{ProductId, ProductSizeId, UserId, VoucherId},
    utils::{jwt::create_access_token, password::hash_password},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const DEFAULT_PASSWORD: &str = "Correct-Horse-42";

/// Records reset links instead of sending them.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .await
            .push((to_email.to_string(), reset_url.to_string()));
        Ok(())
    }
}

impl CapturingMailer {
    /// Token from the most recent reset link sent to `email`.
    pub async fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .and_then(|(_, url)| url.split_once("token=").map(|(_, t)| t.to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub config: Config,
    pub mailer: Arc<CapturingMailer>,
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: "integration-test-secret".into(),
        data_protection_key: "integration-test-protection-key".into(),
        ..Config::default()
    }
}

pub fn test_app() -> TestApp {
    test_app_with_config(test_config())
}

pub fn test_app_with_config(config: Config) -> TestApp {
    let repos = Repositories::from_store(MemoryStore::new());
    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::new(
        config.clone(),
        repos.clone(),
        mailer.clone(),
        Arc::new(NoopGeoLocator),
    );
    TestApp {
        router: app(state),
        repos,
        config,
        mailer,
    }
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

impl TestApp {
    pub async fn seed_user(&self, username: &str, role: UserRole, reward_points: i32) -> User {
        let mut user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            hash_password(DEFAULT_PASSWORD).expect("hash password"),
        );
        user.role = role;
        user.reward_points = reward_points;
        self.repos.users.create(&user).await.expect("seed user")
    }

    pub fn token_for(&self, user: &User) -> String {
        create_access_token(user, &self.config.jwt_secret, self.config.jwt_expiry_days)
            .expect("issue token")
    }

    pub async fn seed_product(&self, owner: UserId, name: &str, price: &str) -> Product {
        self.seed_product_with_sizes(owner, name, price, &[]).await
    }

    pub async fn seed_product_with_sizes(
        &self,
        owner: UserId,
        name: &str,
        price: &str,
        sizes: &[(&str, &str)],
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(0),
            name: name.to_string(),
            description: format!("{} description", name),
            price: dec(price),
            product_type: "serum".to_string(),
            image_file: None,
            user_id: owner,
            sizes: sizes
                .iter()
                .map(|(size, price)| ProductSize {
                    id: ProductSizeId::new(0),
                    product_id: ProductId::new(0),
                    size: size.to_string(),
                    price: dec(price),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.repos.products.create(&product).await.expect("seed product")
    }

    pub async fn seed_voucher(&self, name: &str, cost: i32, quantity: i32) -> Voucher {
        let now = Utc::now();
        let voucher = Voucher {
            id: VoucherId::new(0),
            name: name.to_string(),
            description: String::new(),
            kind: VoucherKind::GiftCard { amount: dec("10") },
            cost,
            quantity,
            status: if quantity == 0 {
                VoucherStatus::Redeemed
            } else {
                VoucherStatus::Active
            },
            valid_from: now - Duration::days(1),
            valid_till: now + Duration::days(30),
            image_file: None,
            created_at: now,
            updated_at: now,
        };
        self.repos.vouchers.create(&voucher).await.expect("seed voucher")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("route request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }
}

/// Decimal fields are serialized as strings.
pub fn decimal_field(value: &Value, field: &str) -> Decimal {
    let raw = &value[field];
    match raw {
        Value::String(s) => dec(s),
        other => dec(&other.to_string()),
    }
}
