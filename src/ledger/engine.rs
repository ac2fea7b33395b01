//! Budget ledger: derives spend, remaining allowance and P&L from a position
//! snapshot, and gates proposed orders against the remaining allowance.
//!
//! Everything here is a pure function of its inputs. Nothing is cached between
//! calls, so the budget state always follows the latest snapshot.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{OrderRequest, OrderSide, Position, RejectReason};

use super::config::{LedgerConfig, DEFAULT_LOW_BUDGET_FRACTION};

/// Budget-aware aggregates derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Allowance the figures were derived against
    pub budget: Decimal,

    /// Sum of `avg_entry_price * quantity`, uncapped
    pub total_cost_basis: Decimal,

    /// Cost basis capped to `[0, budget]`
    pub spent: Decimal,

    /// `budget - spent`, never negative
    pub remaining: Decimal,

    /// Sum of broker-reported market values
    pub current_value: Decimal,

    /// `current_value - total_cost_basis`
    pub profit_loss: Decimal,

    pub position_count: usize,
}

impl LedgerSummary {
    /// Profit/loss relative to the uncapped cost basis.
    pub fn return_pct(&self) -> Decimal {
        self.profit_loss
            .checked_div(self.total_cost_basis)
            .unwrap_or(Decimal::ZERO)
    }

    /// Cost basis above the allowance (drift between the simulated budget and
    /// what the broker let through).
    pub fn overspend(&self) -> Decimal {
        self.total_cost_basis
            .saturating_sub(self.budget)
            .max(Decimal::ZERO)
    }
}

impl std::fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.profit_loss >= Decimal::ZERO { "+" } else { "" };
        writeln!(f, "Budget:        ${:.2}", self.budget)?;
        writeln!(f, "Spent:         ${:.2}", self.spent)?;
        writeln!(f, "Remaining:     ${:.2}", self.remaining)?;
        writeln!(f, "Current Value: ${:.2}", self.current_value)?;
        writeln!(
            f,
            "Profit/Loss:   {}${:.2} ({}{:.2}%)",
            sign,
            self.profit_loss,
            sign,
            self.return_pct().saturating_mul(dec!(100))
        )?;
        write!(f, "Positions:     {}", self.position_count)
    }
}

/// Coarse budget state for warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// At least the low-budget threshold remains
    Healthy,
    /// Some allowance left, but under the threshold
    Low,
    /// Nothing left; buys are blocked
    Exhausted,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Healthy => "HEALTHY",
            BudgetStatus::Low => "LOW",
            BudgetStatus::Exhausted => "EXHAUSTED",
        }
    }

    /// User-facing warning for this state, if any.
    pub fn warning(&self, remaining: Decimal) -> Option<String> {
        match self {
            BudgetStatus::Healthy => None,
            BudgetStatus::Low => Some(format!("Low budget! Only ${:.2} remaining.", remaining)),
            BudgetStatus::Exhausted => {
                Some("Budget exhausted! Sell positions to free up funds.".to_string())
            }
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local accept/reject decision for a proposed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Caller may submit the order to the broker
    Admitted,
    /// Caller must not submit
    Rejected(RejectReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Derive ledger aggregates from a snapshot.
///
/// `spent` is clamped to `[0, budget]` even when the true cost basis exceeds
/// the allowance, while `profit_loss` always uses the uncapped basis.
/// Empty snapshots and a zero budget degrade to zero values. Sums that leave
/// the `Decimal` range saturate at its bounds instead of panicking.
pub fn derive_ledger(positions: &[Position], budget: Decimal) -> LedgerSummary {
    let budget = budget.max(Decimal::ZERO);

    let total_cost_basis = saturating_sum(positions.iter().map(Position::cost_basis));
    let current_value = saturating_sum(positions.iter().map(|p| p.market_value));

    if total_cost_basis.abs() == Decimal::MAX || current_value.abs() == Decimal::MAX {
        warn!(
            positions = positions.len(),
            cost_basis = %total_cost_basis,
            current_value = %current_value,
            "Snapshot totals out of range, saturated"
        );
    }

    let spent = total_cost_basis.min(budget).max(Decimal::ZERO);
    let remaining = (budget - spent).max(Decimal::ZERO);

    LedgerSummary {
        budget,
        total_cost_basis,
        spent,
        remaining,
        current_value,
        profit_loss: current_value.saturating_sub(total_cost_basis),
        position_count: positions.len(),
    }
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Decide whether an order may be sent to the broker.
///
/// Malformed orders are rejected first. Buys are rejected once nothing remains.
/// Sells only free allowance and are never blocked here; share availability is
/// the broker's call.
pub fn admit_order(order: &OrderRequest, ledger: &LedgerSummary) -> Admission {
    if let Err(reason) = order.validate() {
        debug!(symbol = %order.symbol, reason = %reason, "Order rejected");
        return Admission::Rejected(reason);
    }

    if order.side == OrderSide::Buy && ledger.remaining <= Decimal::ZERO {
        debug!(
            symbol = %order.symbol,
            spent = %ledger.spent,
            budget = %ledger.budget,
            "Buy rejected, budget exhausted"
        );
        return Admission::Rejected(RejectReason::BudgetExhausted {
            budget: ledger.budget,
        });
    }

    Admission::Admitted
}

/// Classify the remaining allowance with the default 20% low-budget threshold.
pub fn classify_remaining(remaining: Decimal, budget: Decimal) -> BudgetStatus {
    classify_with_fraction(remaining, budget, DEFAULT_LOW_BUDGET_FRACTION)
}

fn classify_with_fraction(remaining: Decimal, budget: Decimal, fraction: Decimal) -> BudgetStatus {
    if remaining <= Decimal::ZERO {
        BudgetStatus::Exhausted
    } else if remaining < budget.max(Decimal::ZERO).saturating_mul(fraction) {
        BudgetStatus::Low
    } else {
        BudgetStatus::Healthy
    }
}

/// Ledger bound to a session's budget settings.
#[derive(Debug, Clone)]
pub struct Ledger {
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn budget(&self) -> Decimal {
        self.config.budget
    }

    pub fn derive(&self, positions: &[Position]) -> LedgerSummary {
        derive_ledger(positions, self.config.budget)
    }

    pub fn admit(&self, order: &OrderRequest, ledger: &LedgerSummary) -> Admission {
        admit_order(order, ledger)
    }

    pub fn classify(&self, remaining: Decimal) -> BudgetStatus {
        classify_with_fraction(remaining, self.config.budget, self.config.low_budget_fraction)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
