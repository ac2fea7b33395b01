//! Budget ledger: spend/remaining/P&L derivation and order admission.

mod config;
mod engine;

pub use config::{LedgerConfig, DEFAULT_BUDGET, DEFAULT_LOW_BUDGET_FRACTION};
pub use engine::{
    admit_order, classify_remaining, derive_ledger, Admission, BudgetStatus, Ledger,
    LedgerSummary,
};

pub use crate::models::RejectReason;
