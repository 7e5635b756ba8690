use crate::{
    commands::Command,
    db::DbPool,
    entities::order::{self, OrderStatus},
    errors::ServiceError,
    queries::order_queries::{load_with_details, OrderWithDetails},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use super::{
    order_details::{
        apply_detail_changes, plan_detail_changes, validate_with_details, OrderDetailAttributes,
    },
    ORDERS_CREATED, ORDER_VALIDATION_REJECTIONS,
};

/// Inserts a new order and its line items.
///
/// Fields left as `None` fall back to the record defaults (`status` NEW,
/// `order_date` now) or fail validation when they are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_price: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub order_date: Option<DateTime<Utc>>,
    /// Only for imports that carry their original insertion time.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "order_details_attributes")]
    pub order_details: Vec<OrderDetailAttributes>,
}

impl CreateOrderCommand {
    pub fn new(
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        total_price: Decimal,
    ) -> Self {
        Self {
            customer_name: Some(customer_name.into()),
            customer_email: Some(customer_email.into()),
            total_price: Some(total_price),
            ..Default::default()
        }
    }

    pub fn with_details(mut self, details: Vec<OrderDetailAttributes>) -> Self {
        self.order_details = details;
        self
    }

    /// The in-memory candidate, defaults applied.
    pub fn to_active_model(&self) -> order::ActiveModel {
        let mut candidate = order::ActiveModel::new();
        if let Some(name) = &self.customer_name {
            candidate.customer_name = Set(name.clone());
        }
        if let Some(email) = &self.customer_email {
            candidate.customer_email = Set(email.clone());
        }
        if let Some(total_price) = self.total_price {
            candidate.total_price = Set(total_price);
        }
        if let Some(status) = self.status {
            candidate.status = Set(status);
        }
        if let Some(order_date) = self.order_date {
            candidate.order_date = Set(order_date);
        }
        if let Some(created_at) = self.created_at {
            candidate.created_at = Set(created_at);
        }
        candidate
    }
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = OrderWithDetails;

    #[instrument(skip(self, db_pool), fields(customer_email = ?self.customer_email))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();

        let candidate = self.to_active_model();
        let changes = plan_detail_changes(&[], &self.order_details)?;

        validate_with_details(candidate.validate(), &changes).map_err(|e| {
            ORDER_VALIDATION_REJECTIONS.inc();
            warn!("Order rejected by validation: {}", e);
            ServiceError::InvalidRecord(e)
        })?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let saved_order = candidate.insert(&txn).await.map_err(|e| {
            error!("Failed to create order: {}", e);
            ServiceError::db_error(e)
        })?;

        apply_detail_changes(&txn, saved_order.id, changes).await?;

        txn.commit().await.map_err(|e| {
            error!(order_id = %saved_order.id, "Failed to commit order creation: {}", e);
            ServiceError::db_error(e)
        })?;

        ORDERS_CREATED.inc();
        info!(
            order_id = %saved_order.id,
            status = %saved_order.status,
            "Order created successfully"
        );

        load_with_details(db, saved_order).await
    }
}
