//! Insider-buy signals surfaced by the backend's watchlist scan.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One reported insider purchase.
///
/// Dates are kept as the backend sends them (`YYYY-MM-DD`, or "N/A" when the
/// filing has none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderSignal {
    pub symbol: String,

    /// Name of the reporting insider
    pub insider: String,

    /// Transaction date
    pub date: String,

    /// Shares acquired
    pub shares: Decimal,

    /// Price paid per share
    pub price: Decimal,

    /// Total paid (`shares * price`, as reported)
    pub cost: Decimal,

    pub filing_date: String,
}

impl InsiderSignal {
    /// Whole and fractional shares `amount` dollars buys at the insider's price.
    ///
    /// Zero when the price is unknown.
    pub fn shares_for(&self, amount: Decimal) -> Decimal {
        if self.price <= Decimal::ZERO || amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        amount
            .checked_div(self.price)
            .map(|qty| qty.round_dp_with_strategy(4, RoundingStrategy::ToZero))
            .unwrap_or(Decimal::ZERO)
    }
}
