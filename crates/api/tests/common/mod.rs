#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;

use kct_api::auth::jwt::{generate_token, Claims, JwtConfig, ROLE_ADMIN};
use kct_api::config::{ServerConfig, WebhookSecrets};
use kct_api::router::build_app_router;
use kct_api::state::AppState;
use kct_core::types::DbId;
use kct_integrations::mailer::Email;
use kct_integrations::payments::{PaymentIntent, PaymentIntentRequest};
use kct_integrations::shipping::{Address, Parcel, PurchasedLabel, Rate, Shipment};
use kct_integrations::{Integrations, IntegrationError, Mailer, PaymentGateway, ShippingCarrier};
use kct_sync::catalog::SyncOptions;

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const SHOPIFY_SECRET: &str = "shopify-test-secret";
pub const STRIPE_SECRET: &str = "whsec_test_secret";
pub const EASYPOST_SECRET: &str = "easypost-test-secret";

/// Build a test `ServerConfig` with every webhook secret set.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        webhooks: WebhookSecrets {
            shopify: Some(SHOPIFY_SECRET.to_string()),
            stripe: Some(STRIPE_SECRET.to_string()),
            easypost: Some(EASYPOST_SECRET.to_string()),
        },
    }
}

/// Full application router with no third-party integrations configured.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Integrations::default())
}

/// Full application router with the given (usually fake) integrations.
pub fn build_test_app_with(pool: PgPool, integrations: Integrations) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        integrations,
        sync_options: Arc::new(SyncOptions::default()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fake integrations
// ---------------------------------------------------------------------------

/// Records every intent request and answers with a deterministic intent.
#[derive(Default)]
pub struct FakePayments {
    pub requests: Mutex<Vec<PaymentIntentRequest>>,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, IntegrationError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("pi_test_{}", requests.len());
        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id,
            status: "requires_payment_method".into(),
            amount: request.amount_cents,
            currency: request.currency.clone(),
        })
    }
}

/// Quotes two fixed rates and sells a label with a fixed tracking code.
#[derive(Default)]
pub struct FakeCarrier {
    pub shipments: Mutex<Vec<Address>>,
}

#[async_trait]
impl ShippingCarrier for FakeCarrier {
    async fn create_shipment(
        &self,
        to: &Address,
        _parcel: &Parcel,
    ) -> Result<Shipment, IntegrationError> {
        self.shipments.lock().unwrap().push(to.clone());
        let rate = |id: &str, price: &str| Rate {
            id: id.into(),
            carrier: "USPS".into(),
            service: "Priority".into(),
            rate: price.into(),
            currency: Some("USD".into()),
            delivery_days: Some(2),
        };
        Ok(Shipment {
            id: "shp_test".into(),
            rates: vec![rate("rate_fast", "24.10"), rate("rate_cheap", "9.85")],
        })
    }

    async fn buy_label(
        &self,
        shipment_id: &str,
        _rate_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError> {
        Ok(PurchasedLabel {
            shipment_id: shipment_id.to_string(),
            tracking_code: "9400TEST0001".into(),
            carrier: "USPS".into(),
            label_url: "https://labels.test/9400TEST0001.png".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn admin_token() -> String {
    generate_token("admin-1", ROLE_ADMIN, 3600, &test_config().jwt).unwrap()
}

/// Token for a portal user (`authenticated` role) with the given email.
pub fn member_token(email: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: format!("user-{email}"),
        role: "authenticated".into(),
        email: Some(email.to_string()),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// Insert a product with one variant and return the variant id.
pub async fn seed_variant(pool: &PgPool, sku: &str, available: i32, price_cents: i64) -> DbId {
    let (product_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO products (name, handle, base_price_cents) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("Suit {sku}"))
    .bind(format!("suit-{}", sku.to_lowercase()))
    .bind(price_cents)
    .fetch_one(pool)
    .await
    .unwrap();

    let (variant_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO product_variants (product_id, sku, size, price_cents, available_quantity, stock_status) \
         VALUES ($1, $2, '40R', $3, $4, 'in_stock') RETURNING id",
    )
    .bind(product_id)
    .bind(sku)
    .bind(price_cents)
    .bind(available)
    .fetch_one(pool)
    .await
    .unwrap();
    variant_id
}

pub async fn seed_wedding(pool: &PgPool, code: &str) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO weddings (wedding_code, couple_names, wedding_date) \
         VALUES ($1, 'Sam & Alex', '2026-11-14') RETURNING id",
    )
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// Insert a party member with an outfit priced at `outfit_cents`.
pub async fn seed_member(pool: &PgPool, wedding_id: DbId, email: &str, outfit_cents: i64) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO wedding_party_members (wedding_id, first_name, last_name, email) \
         VALUES ($1, 'Jordan', 'Lee', $2) RETURNING id",
    )
    .bind(wedding_id)
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO wedding_outfits (member_id, price_cents) VALUES ($1, $2)")
        .bind(id)
        .bind(outfit_cents)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> axum::response::Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

/// POST raw bytes with extra headers (webhook deliveries).
pub async fn post_raw(
    app: Router,
    uri: &str,
    body: &[u8],
    headers: &[(&str, String)],
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    app.oneshot(builder.body(Body::from(body.to_vec())).unwrap())
        .await
        .unwrap()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the `data` field of a success envelope.
pub async fn expect_data(response: axum::response::Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    json["data"].clone()
}
