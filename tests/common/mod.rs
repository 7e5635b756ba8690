#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use order_records::{
    commands::{orders::CreateOrderCommand, Command},
    db::{self, DbConfig, DbPool},
    queries::order_queries::OrderWithDetails,
    services::OrderService,
};
use rust_decimal::Decimal;

/// Helper harness backed by a fresh in-memory SQLite database.
pub struct TestDb {
    pub pool: Arc<DbPool>,
}

impl TestDb {
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::sqlite_in_memory())
            .await
            .expect("sqlite in-memory pool");
        db::ensure_schema(&pool).await.expect("create order tables");
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn service(&self) -> OrderService {
        OrderService::new(self.pool.clone())
    }

    pub async fn create(&self, command: CreateOrderCommand) -> OrderWithDetails {
        command
            .execute(self.pool.clone())
            .await
            .expect("order should be created")
    }

    /// Inserts an order whose `created_at` is pinned, for date-range searches.
    pub async fn create_at(
        &self,
        email: &str,
        total_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> OrderWithDetails {
        self.create(CreateOrderCommand {
            created_at: Some(created_at),
            ..CreateOrderCommand::new("Test Customer", email, total_price)
        })
        .await
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}
