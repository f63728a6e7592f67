use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use salesdesk_api::config::AppConfig;
use salesdesk_api::db::{self, DbConfig};
use salesdesk_api::services::customers::CreateCustomerRequest;
use salesdesk_api::services::inventory;
use salesdesk_api::services::products::CreateProductRequest;
use salesdesk_api::{app_router, AppState};

/// Test harness backed by an in-memory SQLite database.
///
/// The pool is pinned to a single connection: every connection to
/// `sqlite::memory:` gets its own database, so a larger pool would scatter
/// tables across connections.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };

        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let config = AppConfig {
            environment: "test".to_string(),
            ..Default::default()
        };
        let state = Arc::new(AppState::new(Arc::new(pool), config));
        let router = app_router(state.clone());

        Self { router, state }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_customer(&self, name: &str) -> Uuid {
        let customer = self
            .state
            .services
            .customers
            .create_customer(CreateCustomerRequest {
                name: name.to_string(),
                phone: None,
                email: None,
            })
            .await
            .expect("seed customer for tests");
        customer.id
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Uuid {
        let product = self
            .state
            .services
            .products
            .create_product(CreateProductRequest {
                name: name.to_string(),
                price,
                stock,
                category: None,
            })
            .await
            .expect("seed product for tests");
        product.id
    }

    /// Current stock level straight from the database.
    pub async fn product_stock(&self, id: Uuid) -> i32 {
        inventory::get_stock(self.state.db.as_ref(), id)
            .await
            .expect("query product stock")
            .expect("product exists")
    }
}

/// Deserialize a response body into JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&body).expect("response body is valid JSON")
}

/// Parse a decimal field that rust_decimal serialized as a string.
pub fn decimal_field(value: &Value, key: &str) -> Decimal {
    let raw = value[key]
        .as_str()
        .unwrap_or_else(|| panic!("field '{}' missing or not a string in {}", key, value));
    Decimal::from_str(raw).unwrap_or_else(|_| panic!("field '{}' is not a decimal: {}", key, raw))
}
