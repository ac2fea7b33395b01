//! Trading session: holds the last known position snapshot and runs orders
//! through the ledger before they reach the broker.
//!
//! Handles:
//! - Refreshing the snapshot, keeping the last known one when the broker is unreachable
//! - Local admission (malformed orders, exhausted budget) with no network round trip
//! - Submit, then re-fetch the snapshot only after the broker accepted the order

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::{Broker, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::ledger::{Admission, BudgetStatus, Ledger, LedgerConfig, LedgerSummary, RejectReason};
use crate::models::{OrderRequest, OrderResult, Snapshot};

/// Session configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL
    pub api_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Polling interval for `watch` (seconds)
    pub poll_interval_secs: u64,

    /// Budget settings
    pub ledger: LedgerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval_secs: 30,
            ledger: LedgerConfig::default(),
        }
    }
}

/// The broker could not provide a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotUnavailable {
    pub reason: String,
}

impl std::fmt::Display for SnapshotUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot unavailable: {}", self.reason)
    }
}

/// What happened to a submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Broker accepted the order. `refreshed` is false when the follow-up
    /// snapshot fetch failed and the last known snapshot is still shown.
    Accepted { result: OrderResult, refreshed: bool },

    /// Refused locally; nothing was sent.
    Rejected(RejectReason),

    /// Broker refused the order or could not be reached. The text is the
    /// broker's error, unmodified.
    SubmissionFailed(String),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }

    /// Collapse into the result shown to the user.
    pub fn into_result(self) -> OrderResult {
        match self {
            SubmitOutcome::Accepted { result, .. } => result,
            SubmitOutcome::Rejected(reason) => OrderResult::failed(reason.to_string()),
            SubmitOutcome::SubmissionFailed(error) => OrderResult::failed(error),
        }
    }
}

/// Session counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub accepted: u32,
    pub rejected: u32,
    pub failed: u32,
    pub refresh_failures: u32,
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Statistics ===")?;
        writeln!(f, "Orders Accepted:  {}", self.accepted)?;
        writeln!(f, "Orders Rejected:  {}", self.rejected)?;
        writeln!(f, "Orders Failed:    {}", self.failed)?;
        writeln!(f, "Refresh Failures: {}", self.refresh_failures)?;
        Ok(())
    }
}

/// Paper-trading session against one broker.
///
/// Submissions take `&mut self`, so a single session never has two orders in
/// flight. Separate sessions sharing one broker account are not coordinated.
pub struct TradingSession<B: Broker> {
    broker: B,
    ledger: Ledger,
    snapshot: Snapshot,
    stats: SessionStats,
}

impl<B: Broker> TradingSession<B> {
    /// Start a session with an empty snapshot.
    pub fn new(broker: B, config: LedgerConfig) -> Self {
        Self {
            broker,
            ledger: Ledger::new(config),
            snapshot: Snapshot::empty(),
            stats: SessionStats::default(),
        }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn budget(&self) -> Decimal {
        self.ledger.budget()
    }

    /// Last known snapshot (empty until the first successful refresh).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Ledger aggregates for the current snapshot.
    pub fn summary(&self) -> LedgerSummary {
        self.ledger.derive(&self.snapshot.positions)
    }

    /// Budget state for the current snapshot.
    pub fn status(&self) -> BudgetStatus {
        self.ledger.classify(self.summary().remaining)
    }

    /// Fetch a fresh snapshot from the broker.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&mut self) -> Result<&Snapshot, SnapshotUnavailable> {
        match self.broker.fetch_positions().await {
            Ok(positions) => {
                debug!(positions = positions.len(), "Snapshot refreshed");
                self.snapshot = Snapshot::new(positions);
                Ok(&self.snapshot)
            }
            Err(e) => {
                self.stats.refresh_failures += 1;
                warn!(error = %e, "Failed to refresh snapshot, keeping last known");
                Err(SnapshotUnavailable {
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    /// Run an order through admission, submit it, and refresh on success.
    pub async fn submit(&mut self, order: OrderRequest) -> SubmitOutcome {
        let summary = self.summary();

        if let Admission::Rejected(reason) = self.ledger.admit(&order, &summary) {
            self.stats.rejected += 1;
            info!(
                symbol = %order.symbol,
                side = %order.side,
                remaining = %summary.remaining,
                reason = %reason,
                "Order rejected locally"
            );
            return SubmitOutcome::Rejected(reason);
        }

        info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = %order.quantity,
            remaining = %summary.remaining,
            "Submitting order"
        );

        let result = match self.broker.submit_order(&order).await {
            Ok(result) => result,
            Err(e) => {
                self.stats.failed += 1;
                warn!(symbol = %order.symbol, error = %e, "Order submission failed");
                return SubmitOutcome::SubmissionFailed(format!("{:#}", e));
            }
        };

        if !result.success {
            self.stats.failed += 1;
            let error = result.error.unwrap_or_else(|| "Trade failed".to_string());
            warn!(symbol = %order.symbol, error = %error, "Broker refused order");
            return SubmitOutcome::SubmissionFailed(error);
        }

        self.stats.accepted += 1;
        info!(
            symbol = %order.symbol,
            order_id = ?result.order_id,
            "Order accepted"
        );

        let refreshed = self.refresh().await.is_ok();
        SubmitOutcome::Accepted { result, refreshed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use anyhow::Result;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory broker that records calls.
    #[derive(Default)]
    struct FakeBroker {
        positions: Mutex<Vec<Position>>,
        fail_fetch: AtomicBool,
        /// `None` simulates a transport error
        response: Mutex<Option<OrderResult>>,
        /// Position added to the book when an order is accepted
        fill: Mutex<Option<Position>>,
        fetches: AtomicUsize,
        submissions: AtomicUsize,
    }

    impl FakeBroker {
        fn with_positions(positions: Vec<Position>) -> Self {
            Self {
                positions: Mutex::new(positions),
                response: Mutex::new(Some(OrderResult::accepted("Order placed"))),
                ..Default::default()
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn submissions(&self) -> usize {
            self.submissions.load(Ordering::SeqCst)
        }
    }

    impl Broker for FakeBroker {
        async fn fetch_positions(&self) -> Result<Vec<Position>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            Ok(self.positions.lock().unwrap().clone())
        }

        async fn submit_order(&self, _order: &OrderRequest) -> Result<OrderResult> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            let response = self.response.lock().unwrap().clone();
            let Some(result) = response else {
                anyhow::bail!("request timed out");
            };
            if result.success {
                if let Some(fill) = self.fill.lock().unwrap().clone() {
                    self.positions.lock().unwrap().push(fill);
                }
            }
            Ok(result)
        }
    }

    fn session(positions: Vec<Position>) -> TradingSession<FakeBroker> {
        TradingSession::new(FakeBroker::with_positions(positions), LedgerConfig::default())
    }

    fn over_budget() -> Vec<Position> {
        vec![Position::new("NVDA", dec!(2), dec!(60), dec!(150))]
    }

    #[test]
    fn test_starts_with_empty_snapshot() {
        let s = session(over_budget());

        assert!(s.snapshot().is_empty());
        assert_eq!(s.summary().remaining, dec!(100));
        assert_eq!(s.status(), BudgetStatus::Healthy);
        assert_eq!(s.broker().fetches(), 0);
    }

    #[test]
    fn test_exhausted_budget_blocks_buy_but_not_sell() {
        tokio_test::block_on(async {
            let mut s = session(over_budget());
            s.refresh().await.unwrap();

            let summary = s.summary();
            assert_eq!(summary.spent, dec!(100));
            assert_eq!(summary.profit_loss, dec!(30));
            assert_eq!(s.status(), BudgetStatus::Exhausted);

            let outcome = s.submit(OrderRequest::buy("AMD", dec!(1))).await;
            assert!(matches!(
                outcome,
                SubmitOutcome::Rejected(RejectReason::BudgetExhausted { .. })
            ));
            assert_eq!(s.broker().submissions(), 0);

            let outcome = s.submit(OrderRequest::sell("NVDA", dec!(2))).await;
            assert!(outcome.is_success());
            assert_eq!(s.broker().submissions(), 1);
            // initial refresh + refresh after the accepted sell
            assert_eq!(s.broker().fetches(), 2);
        });
    }

    #[test]
    fn test_malformed_order_never_submitted() {
        tokio_test::block_on(async {
            let mut s = session(vec![]);

            let order = OrderRequest::buy("", dec!(5));
            let outcome = s.submit(order).await;

            assert!(matches!(
                outcome,
                SubmitOutcome::Rejected(RejectReason::InvalidOrder(_))
            ));
            assert_eq!(s.broker().submissions(), 0);
            assert_eq!(s.stats().rejected, 1);
        });
    }

    #[test]
    fn test_refresh_failure_keeps_last_known_snapshot() {
        tokio_test::block_on(async {
            let mut s = session(over_budget());
            s.refresh().await.unwrap();
            let before = s.snapshot().clone();

            s.broker().fail_fetch.store(true, Ordering::SeqCst);
            let err = s.refresh().await.unwrap_err();

            assert!(err.to_string().contains("connection refused"));
            assert_eq!(s.snapshot(), &before);
            assert_eq!(s.stats().refresh_failures, 1);
        });
    }

    #[test]
    fn test_broker_refusal_passed_through_and_snapshot_untouched() {
        tokio_test::block_on(async {
            let mut s = session(vec![Position::new("AAPL", dec!(0.1), dec!(180), dec!(18))]);
            s.refresh().await.unwrap();
            let before = s.snapshot().clone();

            *s.broker().response.lock().unwrap() =
                Some(OrderResult::failed("insufficient qty available for order"));

            let outcome = s.submit(OrderRequest::sell("AAPL", dec!(5))).await;

            assert_eq!(
                outcome,
                SubmitOutcome::SubmissionFailed("insufficient qty available for order".to_string())
            );
            assert_eq!(s.snapshot(), &before);
            assert_eq!(s.broker().fetches(), 1);
            assert_eq!(s.stats().failed, 1);
        });
    }

    #[test]
    fn test_transport_error_is_a_value() {
        tokio_test::block_on(async {
            let mut s = session(vec![]);
            *s.broker().response.lock().unwrap() = None;

            let result = s.submit(OrderRequest::buy("NVDA", dec!(0.1))).await.into_result();

            assert!(!result.success);
            assert!(result.error.unwrap().contains("request timed out"));
        });
    }

    #[test]
    fn test_accepted_buy_refreshes_ledger() {
        tokio_test::block_on(async {
            let mut s = session(vec![]);
            *s.broker().fill.lock().unwrap() =
                Some(Position::new("NVDA", dec!(0.7), dec!(120), dec!(84)));

            let outcome = s.submit(OrderRequest::buy("NVDA", dec!(0.7))).await;

            assert_eq!(
                outcome,
                SubmitOutcome::Accepted {
                    result: OrderResult::accepted("Order placed"),
                    refreshed: true,
                }
            );
            let summary = s.summary();
            assert_eq!(summary.spent, dec!(84));
            assert_eq!(summary.remaining, dec!(16));
            assert_eq!(s.status(), BudgetStatus::Low);
        });
    }

    #[test]
    fn test_accepted_but_refresh_failed() {
        tokio_test::block_on(async {
            let mut s = session(vec![]);
            s.broker().fail_fetch.store(true, Ordering::SeqCst);

            let outcome = s.submit(OrderRequest::buy("NVDA", dec!(1))).await;

            assert!(matches!(outcome, SubmitOutcome::Accepted { refreshed: false, .. }));
            assert!(s.snapshot().is_empty());
            assert_eq!(s.stats().accepted, 1);
        });
    }

    #[test]
    fn test_only_accepted_orders_count_as_success() {
        tokio_test::block_on(async {
            let mut s = session(over_budget());
            s.refresh().await.unwrap();

            assert!(!s.submit(OrderRequest::buy("AMD", dec!(1))).await.is_success());

            *s.broker().response.lock().unwrap() = Some(OrderResult::failed("market closed"));
            assert!(!s.submit(OrderRequest::sell("NVDA", dec!(1))).await.is_success());

            *s.broker().response.lock().unwrap() = None;
            assert!(!s.submit(OrderRequest::sell("NVDA", dec!(1))).await.is_success());

            *s.broker().response.lock().unwrap() = Some(OrderResult::accepted("Order placed"));
            assert!(s.submit(OrderRequest::sell("NVDA", dec!(1))).await.is_success());

            assert_eq!(
                s.stats(),
                &SessionStats {
                    accepted: 1,
                    rejected: 1,
                    failed: 2,
                    refresh_failures: 0,
                }
            );
        });
    }

    #[test]
    fn test_rejection_message_for_user() {
        let outcome = SubmitOutcome::Rejected(RejectReason::BudgetExhausted { budget: dec!(100) });
        let result = outcome.into_result();

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("No budget remaining! You've spent your $100.")
        );
    }
}
