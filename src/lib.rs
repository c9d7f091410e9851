//! OpenSASE Orders
//!
//! Order lifecycle tracking: creation, payment settlement, fulfillment and
//! cancellation.
//!
//! ## Layout
//! - [`domain`]: the order document and its transition rules
//! - [`store`]: keyed persistence with memory and Postgres backends
//! - [`service`]: the lifecycle manager, the only writer of order state
//! - [`api`]: HTTP routes over the manager

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod service;
pub mod store;

pub use config::Config;
pub use domain::{BusinessOrderId, Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, TransitionPolicy};
pub use service::OrderManager;
pub use store::{MemoryOrderStore, OrderStore, PgOrderStore, StorageError};

// =============================================================================
// Error Types
// =============================================================================

/// Failures surfaced by the lifecycle manager. A lookup miss is not an
/// error; operations return `Option` for that.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    #[error("{0}")]
    StateConflict(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn is_validation(&self) -> bool { matches!(self, Self::InvalidStatus(_) | Self::InvalidPaymentStatus(_)) }
}

pub type Result<T> = std::result::Result<T, OrderError>;
