//! Order Aggregate
//!
//! The order document as it is persisted, plus the transition rules the
//! lifecycle manager applies to it. Every mutation here stamps `updated_at`
//! with the instant the caller passes in, so all fields touched by one
//! operation share a single timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::BusinessOrderId;
use crate::OrderError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-assigned primary key; `None` until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub order_id: Option<BusinessOrderId>,
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Caller-declared; never recomputed from `items`.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

/// How strictly status changes are checked.
///
/// `Permissive` accepts any status jump and lets a completed payment force
/// the order back to `CONFIRMED`. `Strict` only moves forward along the
/// fulfillment path and never leaves a terminal status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionPolicy { #[default] Permissive, Strict }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [Self::Pending, Self::Confirmed, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Position on the fulfillment path; `CANCELLED` sits off it.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    pub const fn as_str(&self) -> &'static str {
        match self { Self::Pending => "PENDING", Self::Paid => "PAID", Self::Failed => "FAILED", Self::Refunded => "REFUNDED" }
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or_else(|| OrderError::InvalidPaymentStatus(s.to_string()))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TransitionPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown transition policy `{other}`")),
        }
    }
}

impl Order {
    /// Turns a caller draft into a fresh order. Identity, lifecycle state,
    /// payment reference and timestamps in the draft are discarded.
    pub fn open(mut self, order_id: BusinessOrderId, at: DateTime<Utc>) -> Self {
        self.id = None;
        self.order_id = Some(order_id);
        self.status = OrderStatus::Pending;
        self.payment_status = PaymentStatus::Pending;
        self.transaction_id = None;
        self.created_at = Some(at);
        self.updated_at = Some(at);
        self.delivered_at = None;
        self
    }

    pub fn business_id(&self) -> Option<&str> { self.order_id.as_ref().map(BusinessOrderId::as_str) }

    pub fn change_status(&mut self, status: OrderStatus, policy: TransitionPolicy, at: DateTime<Utc>) -> Result<(), OrderError> {
        if policy == TransitionPolicy::Strict {
            self.check_forward(status)?;
        }
        self.status = status;
        if status == OrderStatus::Delivered {
            // Re-delivery refreshes the timestamp.
            self.delivered_at = Some(at);
        }
        self.touch(at);
        Ok(())
    }

    pub fn record_payment(&mut self, payment: PaymentStatus, transaction_id: Option<String>, policy: TransitionPolicy, at: DateTime<Utc>) -> Result<(), OrderError> {
        let promote = payment == PaymentStatus::Paid;
        if promote && policy == TransitionPolicy::Strict && self.status != OrderStatus::Confirmed {
            self.check_forward(OrderStatus::Confirmed)?;
        }
        self.payment_status = payment;
        self.transaction_id = transaction_id;
        if promote {
            self.status = OrderStatus::Confirmed;
        }
        self.touch(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status == OrderStatus::Delivered {
            return Err(OrderError::StateConflict("cannot cancel delivered order".into()));
        }
        self.status = OrderStatus::Cancelled;
        self.touch(at);
        Ok(())
    }

    fn check_forward(&self, next: OrderStatus) -> Result<(), OrderError> {
        let current = self.status;
        if current == next {
            return Ok(());
        }
        if current.is_terminal() {
            return Err(OrderError::StateConflict(format!("order is {current}; cannot move to {next}")));
        }
        match (current.rank(), next.rank()) {
            (Some(from), Some(to)) if to < from => Err(OrderError::StateConflict(format!("cannot move order back from {current} to {next}"))),
            _ => Ok(()),
        }
    }

    fn touch(&mut self, at: DateTime<Utc>) { self.updated_at = Some(at); }
}
