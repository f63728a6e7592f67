use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{customer, product, quote, sale};
use crate::errors::ServiceError;

#[derive(Debug, Serialize, FromQueryResult)]
pub struct MonthlySales {
    /// `YYYY-MM` bucket.
    pub month: String,
    pub sales_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct PaymentMethodBreakdown {
    pub payment_method: String,
    pub sales_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct TopCustomer {
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub sales_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub struct RecentSale {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub payment_method: crate::entities::PaymentMethod,
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardOverview {
    pub total_customers: u64,
    pub total_products: u64,
    pub total_sales: u64,
    pub total_quotes: u64,
    pub total_revenue: Decimal,
    pub average_ticket: Decimal,
    pub monthly_sales: Vec<MonthlySales>,
    pub sales_by_payment_method: Vec<PaymentMethodBreakdown>,
    pub top_products: Vec<TopProduct>,
    pub top_customers: Vec<TopCustomer>,
    pub low_stock_products: Vec<LowStockProduct>,
    pub recent_sales: Vec<RecentSale>,
}

const TOP_LIMIT: u64 = 5;
const RECENT_LIMIT: u64 = 5;
const MONTHLY_WINDOW: u64 = 12;

/// Read-only aggregate reporting over committed sales. Nothing here mutates
/// state, so every query runs outside any transaction.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DbPool>,
    low_stock_threshold: i32,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>, low_stock_threshold: i32) -> Self {
        Self {
            db,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<DashboardOverview, ServiceError> {
        let total_customers = customer::Entity::find().count(self.db.as_ref()).await?;
        let total_products = product::Entity::find().count(self.db.as_ref()).await?;
        let total_sales = sale::Entity::find().count(self.db.as_ref()).await?;
        let total_quotes = quote::Entity::find().count(self.db.as_ref()).await?;

        let total_revenue = self.total_revenue().await?;
        let average_ticket = if total_sales > 0 {
            (total_revenue / Decimal::from(total_sales)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(DashboardOverview {
            total_customers,
            total_products,
            total_sales,
            total_quotes,
            total_revenue,
            average_ticket,
            monthly_sales: self.monthly_sales().await?,
            sales_by_payment_method: self.sales_by_payment_method().await?,
            top_products: self.top_products().await?,
            top_customers: self.top_customers().await?,
            low_stock_products: self.low_stock_products().await?,
            recent_sales: self.recent_sales().await?,
        })
    }

    async fn total_revenue(&self) -> Result<Decimal, ServiceError> {
        // No COALESCE here: on SQLite it would turn the empty-table NULL into
        // an INTEGER 0, which does not decode as Decimal. Default in Rust.
        #[derive(FromQueryResult)]
        struct Revenue {
            revenue: Option<Decimal>,
        }

        let stmt = Statement::from_string(
            self.backend(),
            "SELECT SUM(total_amount) AS revenue FROM sales".to_string(),
        );
        let revenue = Revenue::find_by_statement(stmt)
            .one(self.db.as_ref())
            .await?
            .and_then(|r| r.revenue)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        Ok(revenue)
    }

    /// Sales bucketed by calendar month, newest first, limited to the last
    /// twelve buckets that contain data. The month expression differs per
    /// backend since SQLite has no `to_char`.
    #[instrument(skip(self))]
    pub async fn monthly_sales(&self) -> Result<Vec<MonthlySales>, ServiceError> {
        let month_expr = match self.backend() {
            DatabaseBackend::Sqlite => "strftime('%Y-%m', sale_date)",
            _ => "to_char(sale_date, 'YYYY-MM')",
        };
        let sql = format!(
            "SELECT {expr} AS month, \
                    COUNT(*) AS sales_count, \
                    COALESCE(SUM(total_amount), 0) AS revenue \
             FROM sales \
             GROUP BY {expr} \
             ORDER BY month DESC \
             LIMIT {limit}",
            expr = month_expr,
            limit = MONTHLY_WINDOW,
        );
        let rows = MonthlySales::find_by_statement(Statement::from_string(self.backend(), sql))
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn sales_by_payment_method(
        &self,
    ) -> Result<Vec<PaymentMethodBreakdown>, ServiceError> {
        let sql = "SELECT payment_method, \
                          COUNT(*) AS sales_count, \
                          COALESCE(SUM(total_amount), 0) AS revenue \
                   FROM sales \
                   GROUP BY payment_method \
                   ORDER BY revenue DESC";
        let rows = PaymentMethodBreakdown::find_by_statement(Statement::from_string(
            self.backend(),
            sql.to_string(),
        ))
        .all(self.db.as_ref())
        .await?;
        Ok(rows)
    }

    /// Best sellers by units across all committed sales. Revenue is computed
    /// from the captured line prices, not the current catalog prices.
    #[instrument(skip(self))]
    pub async fn top_products(&self) -> Result<Vec<TopProduct>, ServiceError> {
        let sql = format!(
            "SELECT si.product_id AS product_id, \
                    p.name AS product_name, \
                    COALESCE(SUM(si.quantity), 0) AS units_sold, \
                    COALESCE(SUM(si.quantity * si.unit_price), 0) AS revenue \
             FROM sale_items si \
             LEFT JOIN products p ON p.id = si.product_id \
             GROUP BY si.product_id, p.name \
             ORDER BY units_sold DESC \
             LIMIT {TOP_LIMIT}"
        );
        let rows = TopProduct::find_by_statement(Statement::from_string(self.backend(), sql))
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn top_customers(&self) -> Result<Vec<TopCustomer>, ServiceError> {
        let sql = format!(
            "SELECT s.customer_id AS customer_id, \
                    c.name AS customer_name, \
                    COUNT(*) AS sales_count, \
                    COALESCE(SUM(s.total_amount), 0) AS revenue \
             FROM sales s \
             LEFT JOIN customers c ON c.id = s.customer_id \
             GROUP BY s.customer_id, c.name \
             ORDER BY revenue DESC \
             LIMIT {TOP_LIMIT}"
        );
        let rows = TopCustomer::find_by_statement(Statement::from_string(self.backend(), sql))
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn low_stock_products(&self) -> Result<Vec<LowStockProduct>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::Stock.lt(self.low_stock_threshold))
            .order_by_asc(product::Column::Stock)
            .all(self.db.as_ref())
            .await?;
        Ok(products
            .into_iter()
            .map(|p| LowStockProduct {
                id: p.id,
                name: p.name,
                stock: p.stock,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn recent_sales(&self) -> Result<Vec<RecentSale>, ServiceError> {
        let rows = sale::Entity::find()
            .find_also_related(customer::Entity)
            .order_by_desc(sale::Column::SaleDate)
            .limit(RECENT_LIMIT)
            .all(self.db.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(sale, customer)| RecentSale {
                id: sale.id,
                customer_name: customer.map(|c| c.name),
                payment_method: sale.payment_method,
                total_amount: sale.total_amount.round_dp(2),
                sale_date: sale.sale_date,
            })
            .collect())
    }

    fn backend(&self) -> DatabaseBackend {
        self.db.get_database_backend()
    }
}
