use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        order::{self, OrderStatus},
        order_detail,
    },
    errors::ServiceError,
    queries::order_queries::{load_with_details, OrderWithDetails},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, EntityTrait, IntoActiveModel, ModelTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{
    order_details::{
        apply_detail_changes, plan_detail_changes, validate_with_details, OrderDetailAttributes,
    },
    ORDERS_UPDATED, ORDER_VALIDATION_REJECTIONS,
};

/// Changes an existing order. Only the fields given are touched; any status may
/// move to any other status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderCommand {
    pub order_id: Uuid,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "order_details_attributes")]
    pub order_details: Vec<OrderDetailAttributes>,
}

impl UpdateOrderCommand {
    pub fn new(order_id: Uuid) -> Self {
        Self {
            order_id,
            customer_name: None,
            customer_email: None,
            total_price: None,
            status: None,
            order_date: None,
            order_details: Vec::new(),
        }
    }

    pub fn status(order_id: Uuid, status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::new(order_id)
        }
    }

    fn assign_to(&self, order: &mut order::ActiveModel) {
        if let Some(name) = &self.customer_name {
            order.customer_name = Set(name.clone());
        }
        if let Some(email) = &self.customer_email {
            order.customer_email = Set(email.clone());
        }
        if let Some(total_price) = self.total_price {
            order.total_price = Set(total_price);
        }
        if let Some(status) = self.status {
            order.status = Set(status);
        }
        if let Some(order_date) = self.order_date {
            order.order_date = Set(order_date);
        }
    }
}

#[async_trait::async_trait]
impl Command for UpdateOrderCommand {
    type Result = OrderWithDetails;

    #[instrument(skip(self, db_pool), fields(order_id = %self.order_id))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let current = order::Entity::find_by_id(self.order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to find order for ID {}: {}", self.order_id, e);
                ServiceError::db_error(e)
            })?
            .ok_or_else(|| {
                warn!("Order not found for ID {}", self.order_id);
                ServiceError::NotFound(format!("Order {} not found", self.order_id))
            })?;

        let existing_details = current
            .find_related(order_detail::Entity)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut candidate = current.into_active_model();
        self.assign_to(&mut candidate);
        let changes = plan_detail_changes(&existing_details, &self.order_details)?;

        validate_with_details(candidate.validate(), &changes).map_err(|e| {
            ORDER_VALIDATION_REJECTIONS.inc();
            warn!("Order update rejected by validation: {}", e);
            ServiceError::InvalidRecord(e)
        })?;

        let updated_order = candidate.update(&txn).await.map_err(|e| {
            error!("Failed to update order {}: {}", self.order_id, e);
            ServiceError::db_error(e)
        })?;

        apply_detail_changes(&txn, updated_order.id, changes).await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit update of order {}: {}", self.order_id, e);
            ServiceError::db_error(e)
        })?;

        ORDERS_UPDATED.inc();
        info!(status = %updated_order.status, "Order updated successfully");

        load_with_details(db, updated_order).await
    }
}
