//! Order domain: the aggregate and its value objects.
pub mod aggregates;
pub mod value_objects;

pub use aggregates::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, TransitionPolicy};
pub use value_objects::BusinessOrderId;
