pub mod order;
pub mod order_detail;

pub use order::{Entity as Order, OrderStatus};
pub use order_detail::Entity as OrderDetail;
