//! In-memory order store.
//!
//! Keeps orders in a `HashMap` behind a tokio `RwLock`. Used by the tests and
//! when the service runs without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, StorageError};
use crate::domain::{Order, OrderStatus, PaymentStatus};

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    async fn select(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders.values().filter(|o| keep(o)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn save(&self, mut order: Order) -> Result<Order, StorageError> {
        let mut orders = self.orders.write().await;
        let id = *order.id.get_or_insert_with(Uuid::now_v7);
        // The unique business id index.
        if let Some(order_id) = &order.order_id {
            if orders.values().any(|o| o.id != Some(id) && o.order_id.as_ref() == Some(order_id)) {
                return Err(StorageError::DuplicateBusinessId(order_id.to_string()));
            }
        }
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StorageError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
        let orders = self.orders.read().await;
        Ok(orders.values().find(|o| o.business_id() == Some(order_id)).cloned())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Order>, StorageError> {
        Ok(self.select(|o| o.user_id == user_id).await)
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StorageError> {
        Ok(self.select(|o| o.status == status).await)
    }

    async fn find_by_payment_status(&self, payment_status: PaymentStatus) -> Result<Vec<Order>, StorageError> {
        Ok(self.select(|o| o.payment_status == payment_status).await)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.select(|_| true).await)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError> {
        self.orders.write().await.remove(&id);
        Ok(())
    }
}
