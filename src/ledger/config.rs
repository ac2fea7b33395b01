//! Ledger configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Default virtual allowance in dollars.
pub const DEFAULT_BUDGET: Decimal = dec!(100);

/// Default fraction of the budget below which the allowance counts as low.
pub const DEFAULT_LOW_BUDGET_FRACTION: Decimal = dec!(0.2);

/// Budget settings, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Virtual allowance that caps cumulative buy cost basis
    pub budget: Decimal,

    /// Remaining allowance below `budget * low_budget_fraction` is reported as low
    pub low_budget_fraction: Decimal,
}

impl LedgerConfig {
    pub fn with_budget(budget: Decimal) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Reject settings a session must not start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.budget <= Decimal::ZERO {
            anyhow::bail!("Budget must be positive, got {}", self.budget);
        }
        if self.low_budget_fraction < Decimal::ZERO || self.low_budget_fraction > Decimal::ONE {
            anyhow::bail!(
                "Low budget fraction must be between 0 and 1, got {}",
                self.low_budget_fraction
            );
        }
        Ok(())
    }

    /// Remaining allowance below which the budget is low.
    pub fn low_budget_threshold(&self) -> Decimal {
        self.budget.saturating_mul(self.low_budget_fraction)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,                           // $100 challenge
            low_budget_fraction: DEFAULT_LOW_BUDGET_FRACTION, // Warn under 20%
        }
    }
}
