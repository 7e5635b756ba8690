pub mod orders;

pub use orders::{OrderListResponse, OrderService};
