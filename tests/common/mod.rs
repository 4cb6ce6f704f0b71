#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use catalog_api::{
    auth::{Claims, ADMIN_ROLE},
    commands::{CreateCategoryCommand, CreateProductCommand},
    config::AppConfig,
    entities::{CategoryModel, ProductModel},
    migrator::Migrator,
    storage::{ImageStorage, LocalImageStorage},
    AppState,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration_test_secret_with_plenty_of_length_42";

/// In-memory SQLite with the schema applied. A single pooled connection keeps
/// every query on the same memory database.
pub async fn memory_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(db)
}

pub fn test_config(media_root: &std::path::Path) -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        TEST_SECRET.to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.storage_root = media_root.display().to_string();
    cfg.storage_public_url = "/media".to_string();
    cfg
}

pub fn mint_token(roles: &[&str]) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: "integration-user".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

/// Helper harness for an application backed by an in-memory SQLite database
/// and a temporary media directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media = TempDir::new().expect("media dir");
        let cfg = test_config(media.path());
        let storage: Arc<dyn ImageStorage> = Arc::new(LocalImageStorage::new(
            media.path(),
            cfg.storage_public_url.clone(),
        ));
        let state = AppState::new(memory_db().await, cfg, storage);
        let router = catalog_api::app_router(state.clone());

        Self {
            router,
            state,
            admin_token: mint_token(&[ADMIN_ROLE]),
            media,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        self.send(method, uri, body, Some(&token)).await
    }

    pub async fn public_get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }
}

pub fn category_command(name: &str, parent_id: Option<Uuid>) -> CreateCategoryCommand {
    serde_json::from_value(json!({
        "name": name,
        "parent_id": parent_id,
    }))
    .expect("category command")
}

pub async fn seed_category(state: &AppState, name: &str, parent: Option<&CategoryModel>) -> CategoryModel {
    state
        .services
        .categories
        .create_category(category_command(name, parent.map(|p| p.id)))
        .await
        .expect("seed category")
}

/// Standard product command priced at `price` with `gp` percent margin.
pub fn standard_product(name: &str, sku: &str, category: Uuid, price: &str, gp: &str) -> CreateProductCommand {
    serde_json::from_value(json!({
        "product_type": "standard",
        "name": name,
        "sku": sku,
        "default_category_id": category,
        "categories": [category],
        "price": price,
        "gp_percentage": gp,
    }))
    .expect("product command")
}

pub async fn seed_product(
    state: &AppState,
    name: &str,
    sku: &str,
    category: &CategoryModel,
    price: &str,
    gp: &str,
) -> ProductModel {
    state
        .services
        .products
        .create_product(standard_product(name, sku, category.id, price, gp))
        .await
        .expect("seed product")
        .product
}

pub fn png_base64() -> String {
    BASE64.encode(b"\x89PNG\r\n\x1a\nfake image bytes")
}
