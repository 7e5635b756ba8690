//! Order records
//!
//! Persisted orders with field validation, defaults for new records,
//! composable search scopes and nested order-detail saves.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod queries;
pub mod services;
pub mod validation;

pub use commands::orders::{
    CreateOrderCommand, DeleteOrderCommand, OrderDetailAttributes, UpdateOrderCommand,
};
pub use entities::OrderStatus;
pub use errors::ServiceError;
pub use queries::order_queries::{build_filtered_query, OrderFilter, OrderScopes, OrderWithDetails};
pub use services::OrderService;
