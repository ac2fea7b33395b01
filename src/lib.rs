//! Paper-trading budget ledger for the insider-signal dashboard.
//!
//! Tracks how much of a fixed virtual allowance is committed across broker
//! positions, gates buys once the allowance is used up, and reports P&L
//! against the real (uncapped) cost basis.

pub mod api;
pub mod ledger;
pub mod models;
pub mod session;
