use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::errors::ServiceError;
use crate::AppState;

async fn dashboard_overview(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let overview = state.services.dashboard.overview().await?;
    Ok(Json(overview))
}

async fn monthly_sales(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.dashboard.monthly_sales().await?;
    Ok(Json(rows))
}

async fn top_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.dashboard.top_products().await?;
    Ok(Json(rows))
}

async fn top_customers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.dashboard.top_customers().await?;
    Ok(Json(rows))
}

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard_overview))
        .route("/monthly-sales", get(monthly_sales))
        .route("/top-products", get(top_products))
        .route("/top-customers", get(top_customers))
}
