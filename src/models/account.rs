//! Broker account figures and recent order history, for display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderSide;

/// Account figures reported by the broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub buying_power: Decimal,
    pub cash: Decimal,
    pub portfolio_value: Decimal,
    pub equity: Decimal,

    /// Broker account status (e.g. "ACTIVE")
    pub status: String,
}

/// A recent order as recorded by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub symbol: String,
    pub quantity: Option<Decimal>,
    pub side: Option<OrderSide>,
    pub order_type: String,
    pub status: String,
    pub filled_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    pub fn is_filled(&self) -> bool {
        self.filled_at.is_some() || self.status.eq_ignore_ascii_case("filled")
    }
}
