//! Data models for positions, orders, the broker account and insider signals.

mod account;
mod order;
mod position;
mod signal;

pub use account::{Account, OrderRecord};
pub use order::{OrderRequest, OrderResult, OrderSide, RejectReason};
pub use position::{Position, Snapshot};
pub use signal::InsiderSignal;
