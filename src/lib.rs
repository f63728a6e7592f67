pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{
    CustomerService, DashboardService, ProductService, QuoteService, SaleService,
};

/// All domain services, constructed once at startup and shared by handlers.
#[derive(Clone)]
pub struct AppServices {
    pub customers: CustomerService,
    pub products: ProductService,
    pub sales: SaleService,
    pub quotes: QuoteService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            customers: CustomerService::new(db.clone()),
            products: ProductService::new(db.clone()),
            sales: SaleService::new(db.clone()),
            quotes: QuoteService::new(db.clone()),
            dashboard: DashboardService::new(db, config.low_stock_threshold),
        }
    }
}

/// Shared application state injected into every handler.
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let services = AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Versioned API surface mounted under `/api/v1`.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/quotes", handlers::quotes::quote_routes())
        .nest("/dashboard", handlers::reports::dashboard_routes())
}

/// Full application router: health probes at the root, resources under
/// `/api/v1`.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "connected" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unreachable" })),
        ),
    }
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
}
