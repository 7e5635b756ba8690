use crate::{
    commands::{
        orders::{CreateOrderCommand, DeleteOrderCommand, DeletedOrder, UpdateOrderCommand},
        Command,
    },
    config::AppConfig,
    db::{DatabaseAccess, DbPool},
    entities::order::{self, OrderStatus},
    errors::ServiceError,
    queries::{
        order_queries::{
            build_filtered_query, GetOrderQuery, OrderFilter, OrderWithDetails, SearchOrdersQuery,
        },
        Query,
    },
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Entry point for everything the crate does with orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    default_page_size: u64,
    max_page_size: u64,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db_pool,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Same as [`OrderService::new`], with page sizes taken from `config`
    pub fn from_config(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            db_pool,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    fn db(&self) -> DatabaseAccess {
        DatabaseAccess::new(self.db_pool.clone())
    }

    fn per_page(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }

    pub async fn create_order(
        &self,
        command: CreateOrderCommand,
    ) -> Result<OrderWithDetails, ServiceError> {
        command.execute(self.db_pool.clone()).await
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderWithDetails>, ServiceError> {
        GetOrderQuery { order_id }.execute(&self.db()).await
    }

    /// Like [`OrderService::get_order`], but a missing order is an error.
    pub async fn find_order(&self, order_id: Uuid) -> Result<OrderWithDetails, ServiceError> {
        self.get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn update_order(
        &self,
        command: UpdateOrderCommand,
    ) -> Result<OrderWithDetails, ServiceError> {
        command.execute(self.db_pool.clone()).await
    }

    /// Moves an order to `status`. Every transition is allowed.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderWithDetails, ServiceError> {
        UpdateOrderCommand::status(order_id, status)
            .execute(self.db_pool.clone())
            .await
    }

    pub async fn delete_order(&self, order_id: Uuid) -> Result<DeletedOrder, ServiceError> {
        DeleteOrderCommand { order_id }
            .execute(self.db_pool.clone())
            .await
    }

    /// Every order matching `filter`, newest first.
    pub async fn search_orders(&self, filter: OrderFilter) -> Result<Vec<order::Model>, ServiceError> {
        SearchOrdersQuery::new(filter).execute(&self.db()).await
    }

    /// One page of matching orders plus the total match count. Pages start at 1.
    #[instrument(skip(self, filter))]
    pub async fn search_orders_page(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = self.per_page(per_page);

        let total = build_filtered_query(order::Entity::find(), &filter)
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count orders");
                ServiceError::db_error(e)
            })?;

        let orders = SearchOrdersQuery::new(filter)
            .page(per_page, (page - 1) * per_page)
            .execute(&self.db())
            .await?;

        info!(
            total = total,
            page = page,
            per_page = per_page,
            returned_count = orders.len(),
            "Orders listed successfully"
        );

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, DbConfig};

    #[tokio::test]
    async fn page_size_falls_back_and_is_capped() {
        let pool = establish_connection_with_config(&DbConfig::sqlite_in_memory())
            .await
            .unwrap();
        let mut config = AppConfig::new("sqlite::memory:".into(), "test".into());
        config.default_page_size = 5;
        config.max_page_size = 50;

        let service = OrderService::from_config(Arc::new(pool), &config);
        assert_eq!(service.per_page(None), 5);
        assert_eq!(service.per_page(Some(0)), 1);
        assert_eq!(service.per_page(Some(500)), 50);
    }
}
