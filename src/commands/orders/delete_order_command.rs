use crate::{
    commands::Command,
    db::DbPool,
    entities::{order, order_detail},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::ORDERS_DELETED;

/// Removes an order together with all of its details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOrderCommand {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedOrder {
    pub id: Uuid,
    pub deleted_details: u64,
}

#[async_trait::async_trait]
impl Command for DeleteOrderCommand {
    type Result = DeletedOrder;

    #[instrument(skip(self, db_pool), fields(order_id = %self.order_id))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        order::Entity::find_by_id(self.order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                warn!("Order not found for ID {}", self.order_id);
                ServiceError::NotFound(format!("Order {} not found", self.order_id))
            })?;

        // sqlite does not enforce foreign keys unless asked to, so details go first
        let details = order_detail::Entity::delete_many()
            .filter(order_detail::Column::OrderId.eq(self.order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to delete details of order {}: {}", self.order_id, e);
                ServiceError::db_error(e)
            })?;

        order::Entity::delete_by_id(self.order_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to delete order {}: {}", self.order_id, e);
                ServiceError::db_error(e)
            })?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        ORDERS_DELETED.inc();
        info!(
            deleted_details = details.rows_affected,
            "Order deleted successfully"
        );

        Ok(DeletedOrder {
            id: self.order_id,
            deleted_details: details.rows_affected,
        })
    }
}
