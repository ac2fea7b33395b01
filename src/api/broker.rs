//! Seam between the trading session and whatever holds the positions of record.

use anyhow::Result;

use crate::models::{OrderRequest, OrderResult, Position};

/// External collaborator that owns positions and executes orders.
///
/// Implementations report transport problems as `Err`; a broker that answered
/// but refused the order returns `Ok` with `success == false`.
#[allow(async_fn_in_trait)]
pub trait Broker {
    /// Read the current positions.
    async fn fetch_positions(&self) -> Result<Vec<Position>>;

    /// Submit an order that already passed local admission.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult>;
}
