use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};

pub mod create_order_command;
pub mod delete_order_command;
pub mod order_details;
pub mod update_order_command;

pub use create_order_command::CreateOrderCommand;
pub use delete_order_command::{DeleteOrderCommand, DeletedOrder};
pub use order_details::{DetailChange, OrderDetailAttributes};
pub use update_order_command::UpdateOrderCommand;

lazy_static! {
    pub(crate) static ref ORDERS_CREATED: IntCounter =
        register_int_counter!("orders_created_total", "Total number of orders created")
            .expect("metric can be created");
    pub(crate) static ref ORDERS_UPDATED: IntCounter =
        register_int_counter!("orders_updated_total", "Total number of orders updated")
            .expect("metric can be created");
    pub(crate) static ref ORDERS_DELETED: IntCounter =
        register_int_counter!("orders_deleted_total", "Total number of orders deleted")
            .expect("metric can be created");
    pub(crate) static ref ORDER_VALIDATION_REJECTIONS: IntCounter = register_int_counter!(
        "order_validation_rejections_total",
        "Total number of order writes rejected by validation"
    )
    .expect("metric can be created");
}
