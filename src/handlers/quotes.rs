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
use crate::services::quotes::{CreateQuoteRequest, UpdateQuoteRequest};
use crate::AppState;

async fn create_quote(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.create_quote(payload).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn list_quotes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let quotes = state.services.quotes.list_quotes().await?;
    Ok(Json(quotes))
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.get_quote(id).await?;
    Ok(Json(quote))
}

async fn update_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.update_quote(id, payload).await?;
    Ok(Json(quote))
}

async fn delete_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.quotes.delete_quote(id).await?;
    Ok(Json(MessageResponse::new("Quote deleted successfully")))
}

pub fn quote_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route(
            "/:id",
            get(get_quote).put(update_quote).delete(delete_quote),
        )
}
