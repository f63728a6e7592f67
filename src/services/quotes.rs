use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{customer, quote};
use crate::errors::ServiceError;

const QUOTE_STATUSES: &[&str] = &["pending", "approved", "rejected"];

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuoteRequest {
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub quote_date: DateTime<Utc>,
}

fn normalize_status(raw: &str) -> Result<String, ServiceError> {
    let status = raw.trim().to_lowercase();
    if QUOTE_STATUSES.contains(&status.as_str()) {
        Ok(status)
    } else {
        Err(ServiceError::ValidationError(format!(
            "Unknown quote status '{}'",
            raw
        )))
    }
}

fn check_amount(amount: Decimal) -> Result<(), ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Quote amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Quotes are estimates only. Unlike sales they never move stock and their
/// totals are supplied by the caller, not derived from line items.
#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DbPool>,
}

impl QuoteService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_quote(
        &self,
        request: CreateQuoteRequest,
    ) -> Result<QuoteResponse, ServiceError> {
        check_amount(request.total_amount)?;
        let status = match request.status.as_deref() {
            Some(raw) => normalize_status(raw)?,
            None => "pending".to_string(),
        };

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let now = Utc::now();
        let quote = quote::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            total_amount: Set(request.total_amount.round_dp(2)),
            status: Set(status),
            quote_date: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let model = quote.insert(self.db.as_ref()).await?;
        info!(quote_id = %model.id, "quote created");
        Ok(self.to_response(model, Some(customer.name)))
    }

    #[instrument(skip(self))]
    pub async fn get_quote(&self, id: Uuid) -> Result<QuoteResponse, ServiceError> {
        let quote = quote::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", id)))?;
        let customer_name = self.customer_name(quote.customer_id).await?;
        Ok(self.to_response(quote, customer_name))
    }

    #[instrument(skip(self))]
    pub async fn list_quotes(&self) -> Result<Vec<QuoteResponse>, ServiceError> {
        let quotes = quote::Entity::find()
            .order_by_desc(quote::Column::QuoteDate)
            .all(self.db.as_ref())
            .await?;

        let mut responses = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let customer_name = self.customer_name(quote.customer_id).await?;
            responses.push(self.to_response(quote, customer_name));
        }
        Ok(responses)
    }

    #[instrument(skip(self, request))]
    pub async fn update_quote(
        &self,
        id: Uuid,
        request: UpdateQuoteRequest,
    ) -> Result<QuoteResponse, ServiceError> {
        check_amount(request.total_amount)?;
        let status = normalize_status(&request.status)?;

        let quote = quote::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", id)))?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let mut active: quote::ActiveModel = quote.into();
        active.customer_id = Set(customer.id);
        active.total_amount = Set(request.total_amount.round_dp(2));
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(self.db.as_ref()).await?;
        info!(quote_id = %id, "quote updated");
        Ok(self.to_response(model, Some(customer.name)))
    }

    #[instrument(skip(self))]
    pub async fn delete_quote(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = quote::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Quote {} not found", id)));
        }
        info!(quote_id = %id, "quote deleted");
        Ok(())
    }

    async fn customer_name(&self, customer_id: Uuid) -> Result<Option<String>, ServiceError> {
        Ok(customer::Entity::find_by_id(customer_id)
            .one(self.db.as_ref())
            .await?
            .map(|c| c.name))
    }

    fn to_response(&self, model: quote::Model, customer_name: Option<String>) -> QuoteResponse {
        QuoteResponse {
            id: model.id,
            customer_id: model.customer_id,
            customer_name,
            total_amount: model.total_amount.round_dp(2),
            status: model.status,
            quote_date: model.quote_date,
        }
    }
}
