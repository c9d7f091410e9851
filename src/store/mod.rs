//! Order persistence.
//!
//! The store is a keyed document collection: one [`Order`] per internal id,
//! with secondary lookups by business id, owner, status and payment status.
//! `save` always replaces the whole record; there is no partial update.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, PaymentStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("Backend error: {0}")]
    Backend(String),
    /// A different record already carries this business order id.
    #[error("Duplicate business order id: {0}")]
    DuplicateBusinessId(String),
    /// A stored record could not be mapped to or from an [`Order`].
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::Serialization(e.to_string()),
            _ => Self::Backend(e.to_string()),
        }
    }
}

/// Storage backend for orders.
///
/// Implementations must be safe to share across concurrent requests. Each
/// `save` is atomic for its single record; nothing spans two calls.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts when `order.id` is `None` (assigning a fresh id), otherwise
    /// replaces the record under that id. Returns the persisted record.
    async fn save(&self, order: Order) -> Result<Order, StorageError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StorageError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, StorageError>;

    /// Orders owned by `user_id`, newest first.
    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Order>, StorageError>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StorageError>;

    async fn find_by_payment_status(&self, payment_status: PaymentStatus) -> Result<Vec<Order>, StorageError>;

    /// Every order, newest first.
    async fn find_all(&self) -> Result<Vec<Order>, StorageError>;

    /// Removes the record if present. Missing ids are not an error.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError>;
}
