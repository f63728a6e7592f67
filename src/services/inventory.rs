use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ServiceError;

/// Stock mutation helpers. These are free functions generic over
/// [`ConnectionTrait`] so they run inside the caller's transaction: the sale
/// coordinator passes its open transaction and every decrement rolls back
/// with the rest of the sale if the commit never happens.
///
/// Current stock level, or `None` when the product does not exist.
pub async fn get_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<Option<i32>, ServiceError> {
    let stock = product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .map(|p| p.stock);
    Ok(stock)
}

/// Reserves `quantity` units of a product by decrementing its stock.
///
/// The decrement is a single conditional UPDATE guarded by `stock >= quantity`,
/// so two concurrent sales can never drive stock negative: the second UPDATE
/// matches zero rows and the sale fails with [`ServiceError::InsufficientStock`].
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            product_id = %product.id,
            requested = quantity,
            "stock reservation failed"
        );
        return Err(ServiceError::InsufficientStock(format!(
            "product '{}' does not have enough stock for the requested quantity",
            product.name
        )));
    }

    debug!(product_id = %product.id, quantity, "stock decremented");
    Ok(())
}

/// Returns `quantity` units to a product's stock.
///
/// Used when a sale is deleted. A missing product (deleted from the catalog
/// after the sale) is skipped rather than treated as an error, so deleting an
/// old sale always succeeds.
pub async fn increment_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        debug!(%product_id, "product no longer exists, stock not restored");
    } else {
        debug!(%product_id, quantity, "stock restored");
    }
    Ok(())
}
