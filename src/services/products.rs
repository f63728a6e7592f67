use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::product;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price.round_dp(2),
            stock: model.stock,
            category: model.category,
            created_at: model.created_at,
        }
    }
}

fn check_price_and_stock(price: Decimal, stock: i32) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Product price must not be negative".to_string(),
        ));
    }
    if stock < 0 {
        return Err(ServiceError::ValidationError(
            "Product stock must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// CRUD over the product catalog. Stock edits here are administrative;
/// sale-driven stock movement goes through the sale coordinator.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        check_price_and_stock(request.price, request.stock)?;

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            price: Set(request.price.round_dp(2)),
            stock: Set(request.stock),
            category: Set(request.category),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let model = product.insert(self.db.as_ref()).await?;
        info!(product_id = %model.id, "product created");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductResponse, ServiceError> {
        let product = product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
        Ok(product.into())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = product::Entity::find()
            .order_by_asc(product::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        check_price_and_stock(request.price, request.stock)?;

        let product = product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut active: product::ActiveModel = product.into();
        active.name = Set(request.name.trim().to_string());
        active.price = Set(request.price.round_dp(2));
        active.stock = Set(request.stock);
        active.category = Set(request.category);
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(self.db.as_ref()).await?;
        info!(product_id = %model.id, "product updated");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
