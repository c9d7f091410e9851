//! Order lifecycle manager.
//!
//! Every mutation follows the same read-modify-write shape: load by business
//! id, apply the transition to the in-memory record, save the whole record.
//! There is no version check between the load and the save, so two
//! concurrent writers to one order race and the later save wins.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::value_objects::{self, BusinessOrderId};
use crate::domain::{Order, OrderStatus, PaymentStatus, TransitionPolicy};
use crate::store::OrderStore;
use crate::Result;

#[derive(Clone)]
pub struct OrderManager {
    store: Arc<dyn OrderStore>,
    policy: TransitionPolicy,
}

impl OrderManager {
    pub fn new(store: Arc<dyn OrderStore>) -> Self { Self { store, policy: TransitionPolicy::default() } }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self { self.policy = policy; self }

    pub fn policy(&self) -> TransitionPolicy { self.policy }

    /// Persists a new order built from `draft`, which only contributes the
    /// owner, items, declared total and shipping details.
    pub async fn create_order(&self, draft: Order) -> Result<Order> {
        let order = draft.open(BusinessOrderId::generate(), value_objects::now());
        let order = self.store.save(order).await?;
        tracing::info!(order_id = order.business_id(), user_id = %order.user_id, items = order.items.len(), "order created");
        Ok(order)
    }

    pub async fn get_order_by_id(&self, id: Uuid) -> Result<Option<Order>> { Ok(self.store.find_by_id(id).await?) }

    pub async fn get_order_by_business_id(&self, order_id: &str) -> Result<Option<Order>> { Ok(self.store.find_by_order_id(order_id).await?) }

    pub async fn list_orders(&self) -> Result<Vec<Order>> { Ok(self.store.find_all().await?) }

    /// Newest first.
    pub async fn get_orders_by_owner(&self, user_id: &str) -> Result<Vec<Order>> { Ok(self.store.find_by_user_id(user_id).await?) }

    pub async fn get_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> { Ok(self.store.find_by_status(status).await?) }

    pub async fn get_orders_by_payment_status(&self, payment_status: PaymentStatus) -> Result<Vec<Order>> {
        Ok(self.store.find_by_payment_status(payment_status).await?)
    }

    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Option<Order>> {
        let policy = self.policy;
        let updated = self.mutate(order_id, |order, at| order.change_status(status, policy, at)).await?;
        if updated.is_some() {
            tracing::info!(order_id, %status, "order status updated");
        }
        Ok(updated)
    }

    /// Records a payment outcome. `transaction_id` replaces whatever was
    /// stored, even when it is `None`. A `PAID` outcome moves the order to
    /// `CONFIRMED`.
    pub async fn update_payment_status(&self, order_id: &str, payment_status: PaymentStatus, transaction_id: Option<String>) -> Result<Option<Order>> {
        let policy = self.policy;
        let updated = self.mutate(order_id, |order, at| order.record_payment(payment_status, transaction_id, policy, at)).await?;
        if let Some(order) = &updated {
            tracing::info!(order_id, %payment_status, status = %order.status, "payment status updated");
        }
        Ok(updated)
    }

    /// Cancels the order unless it has already been delivered.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Option<Order>> {
        let cancelled = self.mutate(order_id, |order, at| order.cancel(at)).await?;
        if cancelled.is_some() {
            tracing::info!(order_id, "order cancelled");
        }
        Ok(cancelled)
    }

    /// Hard delete by internal id, regardless of status.
    pub async fn delete_order(&self, id: Uuid) -> Result<()> {
        self.store.delete_by_id(id).await?;
        tracing::info!(%id, "order deleted");
        Ok(())
    }

    async fn mutate<F>(&self, order_id: &str, apply: F) -> Result<Option<Order>>
    where
        F: FnOnce(&mut Order, DateTime<Utc>) -> Result<()>,
    {
        let Some(mut order) = self.store.find_by_order_id(order_id).await? else {
            tracing::debug!(order_id, "order not found");
            return Ok(None);
        };
        if let Err(e) = apply(&mut order, value_objects::now()) {
            tracing::warn!(order_id, status = %order.status, error = %e, "transition rejected");
            return Err(e);
        }
        Ok(Some(self.store.save(order).await?))
    }
}
