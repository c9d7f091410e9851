//! Value Objects for order tracking

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const ORDER_ID_PREFIX: &str = "ORD-";

/// Externally visible order identifier, `ORD-<token>`.
///
/// The token is the simple form of a UUID v7: time-ordered with a random
/// tail, so concurrent creations never need to coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessOrderId(String);

impl BusinessOrderId {
    pub fn generate() -> Self { Self(format!("{ORDER_ID_PREFIX}{}", Uuid::now_v7().simple())) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for BusinessOrderId {
    fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for BusinessOrderId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl fmt::Display for BusinessOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Current time at the precision the database keeps (microseconds), so a
/// stored record compares equal to the one handed back by the manager.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }
