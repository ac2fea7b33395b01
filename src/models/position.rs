//! Position model representing a currently held instrument at the broker.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One held instrument, as reported by the broker.
///
/// Positions are created and destroyed by the broker in response to executed
/// orders. The ledger only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ticker symbol (uppercase by convention)
    pub symbol: String,

    /// Shares held; fractional and signed
    pub quantity: Decimal,

    /// Volume-weighted average cost per share
    pub avg_entry_price: Decimal,

    /// Last price reported by the broker
    #[serde(default)]
    pub current_price: Decimal,

    /// Mark-to-market value as reported by the broker (not recomputed here)
    pub market_value: Decimal,

    /// Unrealized P&L in currency, display only
    #[serde(default)]
    pub unrealized_pl: Decimal,

    /// Unrealized P&L in percent, display only
    #[serde(default)]
    pub unrealized_pl_percent: Decimal,
}

impl Position {
    /// Create a position with the fields the ledger cares about.
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        avg_entry_price: Decimal,
        market_value: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: Decimal::ZERO,
            market_value,
            unrealized_pl: Decimal::ZERO,
            unrealized_pl_percent: Decimal::ZERO,
        }
    }

    /// Amount paid for the shares currently held.
    ///
    /// Saturates at the `Decimal` bounds for quantities or prices too large
    /// to multiply.
    pub fn cost_basis(&self) -> Decimal {
        self.avg_entry_price.saturating_mul(self.quantity)
    }
}

/// Point-in-time list of positions read from the broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub positions: Vec<Position>,

    /// When the broker answered; `None` for the initial empty snapshot
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The valid starting point before any fetch succeeded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(positions: Vec<Position>) -> Self {
        Self {
            positions,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
