use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::{ApiJson, MessageResponse};
use crate::services::sales::{CreateSaleRequest, UpdateSaleRequest};
use crate::AppState;

async fn create_sale(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.create_sale(payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn list_sales(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.list_sales().await?;
    Ok(Json(sales))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.get_sale(id).await?;
    Ok(Json(sale))
}

async fn update_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.update_sale(id, payload).await?;
    Ok(Json(sale))
}

async fn delete_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.sales.delete_sale(id).await?;
    Ok(Json(MessageResponse::new(
        "Sale deleted and stock restored successfully",
    )))
}

pub fn sale_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route(
            "/:id",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
}
