use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{customer, product, sale, sale_item, PaymentMethod};
use crate::errors::ServiceError;
use crate::services::inventory;

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: Uuid,
    pub payment_method: String,
    pub items: Vec<SaleItemRequest>,
}

/// Updating a sale only re-labels it. Line items and the stored total are
/// immutable once the sale is committed; correcting them means deleting the
/// sale and creating a new one.
#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: Uuid,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
}

fn parse_payment_method(raw: &str) -> Result<PaymentMethod, ServiceError> {
    PaymentMethod::from_str(raw).map_err(|_| {
        ServiceError::ValidationError(format!("Unknown payment method '{}'", raw))
    })
}

/// Coordinates the sale lifecycle. Every stock movement in the system goes
/// through this service inside a single database transaction, so a sale and
/// its stock effects are always committed or rolled back together.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a sale from the customer's cart.
    ///
    /// Runs in two phases inside one transaction. Phase one validates the
    /// whole request without mutating anything: the customer must exist and
    /// every item must name an existing product, a positive quantity, and
    /// sufficient stock. Phase two writes the sale, captures each product's
    /// current price on its line item, and decrements stock. Any failure in
    /// either phase rolls the whole transaction back, so a rejected sale
    /// leaves stock untouched.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
    ) -> Result<SaleResponse, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Sale must contain at least one item".to_string(),
            ));
        }
        let payment_method = parse_payment_method(&request.payment_method)?;

        let txn = self.db.begin().await?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        // Phase one: validate every line before touching stock, in request
        // order so the first bad line is the one reported.
        let mut lines: Vec<(product::Model, i32)> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for product {} must be greater than zero",
                    item.product_id
                )));
            }

            let product = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if product.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "product '{}' does not have enough stock for the requested quantity",
                    product.name
                )));
            }

            lines.push((product, item.quantity));
        }

        // Phase two: write the sale, snapshot prices, reserve stock.
        let total: Decimal = lines
            .iter()
            .map(|(product, quantity)| product.price * Decimal::from(*quantity))
            .sum::<Decimal>()
            .round_dp(2);

        let now = Utc::now();
        let sale_id = Uuid::new_v4();
        let sale = sale::ActiveModel {
            id: Set(sale_id),
            customer_id: Set(customer.id),
            payment_method: Set(payment_method),
            total_amount: Set(total),
            sale_date: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let sale = sale.insert(&txn).await?;

        for (product, quantity) in &lines {
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(product.id),
                quantity: Set(*quantity),
                unit_price: Set(product.price.round_dp(2)),
                created_at: Set(now),
            };
            item.insert(&txn).await?;

            inventory::decrement_stock(&txn, product, *quantity).await?;
        }

        txn.commit().await?;
        info!(%sale_id, %total, "sale created");

        self.materialize(self.db.as_ref(), sale).await
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, id: Uuid) -> Result<SaleResponse, ServiceError> {
        let sale = sale::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;
        self.materialize(self.db.as_ref(), sale).await
    }

    #[instrument(skip(self))]
    pub async fn list_sales(&self) -> Result<Vec<SaleResponse>, ServiceError> {
        let sales = sale::Entity::find()
            .order_by_desc(sale::Column::SaleDate)
            .all(self.db.as_ref())
            .await?;

        let mut responses = Vec::with_capacity(sales.len());
        for sale in sales {
            responses.push(self.materialize(self.db.as_ref(), sale).await?);
        }
        Ok(responses)
    }

    /// Re-labels a sale: customer and payment method only. Stock and the
    /// stored total are never touched here.
    #[instrument(skip(self, request))]
    pub async fn update_sale(
        &self,
        id: Uuid,
        request: UpdateSaleRequest,
    ) -> Result<SaleResponse, ServiceError> {
        let payment_method = parse_payment_method(&request.payment_method)?;

        let sale = sale::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        customer::Entity::find_by_id(request.customer_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let mut active: sale::ActiveModel = sale.into();
        active.customer_id = Set(request.customer_id);
        active.payment_method = Set(payment_method);
        active.updated_at = Set(Some(Utc::now()));

        let sale = active.update(self.db.as_ref()).await?;
        info!(sale_id = %id, "sale updated");
        self.materialize(self.db.as_ref(), sale).await
    }

    /// Deletes a sale and returns its reserved stock to the catalog.
    ///
    /// Products removed from the catalog since the sale are skipped when
    /// restoring stock; the deletion itself still succeeds.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let sale = sale::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .all(&txn)
            .await?;

        for item in &items {
            inventory::increment_stock(&txn, item.product_id, item.quantity).await?;
        }

        sale_item::Entity::delete_many()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .exec(&txn)
            .await?;
        sale::Entity::delete_by_id(sale.id).exec(&txn).await?;

        txn.commit().await?;
        info!(sale_id = %id, restored_items = items.len(), "sale deleted");
        Ok(())
    }

    /// Builds the full API representation of a sale: customer name and line
    /// items with captured prices and computed subtotals. Missing customers
    /// or products (deleted since the sale) render as `None` names.
    async fn materialize<C: ConnectionTrait>(
        &self,
        conn: &C,
        sale: sale::Model,
    ) -> Result<SaleResponse, ServiceError> {
        let customer_name = customer::Entity::find_by_id(sale.customer_id)
            .one(conn)
            .await?
            .map(|c| c.name);

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .order_by_asc(sale_item::Column::CreatedAt)
            .all(conn)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let product_names: HashMap<Uuid, String> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let items = items
            .into_iter()
            .map(|item| SaleItemResponse {
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price.round_dp(2),
                subtotal: item.subtotal(),
            })
            .collect();

        Ok(SaleResponse {
            id: sale.id,
            customer_id: sale.customer_id,
            customer_name,
            payment_method: sale.payment_method,
            total_amount: sale.total_amount.round_dp(2),
            sale_date: sale.sale_date,
            items,
        })
    }
}
