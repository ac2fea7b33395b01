//! Dashboard backend client for positions, account, orders, insider signals
//! and order submission.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    Account, InsiderSignal, OrderRecord, OrderRequest, OrderResult, OrderSide, Position,
};

use super::broker::Broker;
use super::types::*;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the backend's paper-trading endpoints.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create with a custom base URL and request timeout.
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the portfolio: account figures plus positions.
    pub async fn get_portfolio(&self) -> Result<PortfolioResponse> {
        let url = format!("{}/api/portfolio", self.base_url);

        debug!(url = %url, "Fetching portfolio");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch portfolio")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Portfolio request failed: {} - {}", status, body);
        }

        let portfolio: PortfolioResponse = response
            .json()
            .await
            .context("Failed to parse portfolio response")?;

        if !portfolio.success {
            anyhow::bail!("Portfolio request reported failure");
        }

        Ok(portfolio)
    }

    /// Fetch current positions.
    pub async fn get_positions(&self) -> Result<Vec<Position>> {
        let portfolio = self.get_portfolio().await?;

        let positions = portfolio
            .positions
            .into_iter()
            .filter_map(|p| {
                if p.qty.is_zero() {
                    warn!(symbol = %p.symbol, "Skipping position with zero quantity");
                    return None;
                }

                Some(Position {
                    symbol: p.symbol,
                    quantity: p.qty,
                    avg_entry_price: p.avg_entry_price,
                    current_price: p.current_price,
                    market_value: p.market_value,
                    unrealized_pl: p.unrealized_pl,
                    unrealized_pl_percent: p.unrealized_plpc,
                })
            })
            .collect();

        Ok(positions)
    }

    /// Fetch broker account figures.
    pub async fn get_account(&self) -> Result<Account> {
        let portfolio = self.get_portfolio().await?;

        let account = portfolio
            .account
            .ok_or_else(|| anyhow::anyhow!("Portfolio response has no account"))?;

        if let Some(error) = account.error {
            anyhow::bail!("Account unavailable: {}", error);
        }

        Ok(Account {
            buying_power: account.buying_power,
            cash: account.cash,
            portfolio_value: account.portfolio_value,
            equity: account.equity,
            status: account.status,
        })
    }

    /// Fetch recent orders (newest first, as the broker returns them).
    pub async fn get_orders(&self) -> Result<Vec<OrderRecord>> {
        let url = format!("{}/api/orders", self.base_url);

        debug!(url = %url, "Fetching orders");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch orders")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Orders request failed: {} - {}", status, body);
        }

        let items: OrdersResponse = response
            .json()
            .await
            .context("Failed to parse orders response")?;

        if !items.success {
            anyhow::bail!("Orders request reported failure");
        }

        Ok(items.orders.into_iter().map(order_record).collect())
    }

    /// Check whether the backend is up and configured.
    pub async fn get_health(&self) -> Result<HealthResponse> {
        let url = format!("{}/api/health", self.base_url);

        debug!(url = %url, "Checking backend health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Health request failed: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse health response")
    }

    /// Fetch insider-buy signals for the backend's watchlist, newest first.
    pub async fn get_insider_trades(&self) -> Result<Vec<InsiderSignal>> {
        let url = format!("{}/api/insider-trades", self.base_url);

        debug!(url = %url, "Fetching insider trades");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch insider trades")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Insider trades request failed: {} - {}", status, body);
        }

        let items: InsiderTradesResponse = response
            .json()
            .await
            .context("Failed to parse insider trades response")?;

        if !items.success {
            anyhow::bail!("Insider trades request reported failure");
        }

        if items.count != items.data.len() {
            debug!(count = items.count, received = items.data.len(), "Insider trade count mismatch");
        }

        Ok(items.data.into_iter().filter_map(insider_signal).collect())
    }

    /// Fetch the symbols the backend scans for insider activity.
    pub async fn get_watchlist(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/watchlist", self.base_url);

        debug!(url = %url, "Fetching watchlist");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch watchlist")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Watchlist request failed: {} - {}", status, body);
        }

        let watchlist: WatchlistResponse = response
            .json()
            .await
            .context("Failed to parse watchlist response")?;

        Ok(watchlist.watchlist)
    }

    /// Submit an order.
    ///
    /// Refusals by the backend (non-2xx or `success: false`) come back as a
    /// failed [`OrderResult`] carrying the backend's error text verbatim.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        let url = format!("{}/api/trade", self.base_url);
        let body = TradeRequest {
            symbol: order.symbol.to_uppercase(),
            qty: order.quantity,
            side: order.side,
        };

        debug!(
            url = %url,
            symbol = %body.symbol,
            qty = %body.qty,
            side = %body.side,
            "Submitting order"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to submit order")?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Ok(refusal_result(status, &text));
        }

        // The backend answered 2xx, so the order may already be live
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(symbol = %body.symbol, error = %e, "Order outcome unknown, check recent orders");
                return Err(e).context("Failed to read trade response");
            }
        };

        let trade: TradeResponse = match serde_json::from_str(&text) {
            Ok(trade) => trade,
            Err(e) => {
                warn!(symbol = %body.symbol, error = %e, "Order outcome unknown, check recent orders");
                return Err(e).context("Failed to parse trade response");
            }
        };

        Ok(trade_result(trade))
    }
}

impl Broker for BackendClient {
    async fn fetch_positions(&self) -> Result<Vec<Position>> {
        self.get_positions().await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        self.place_order(order).await
    }
}

fn trade_result(trade: TradeResponse) -> OrderResult {
    if trade.success {
        OrderResult {
            success: true,
            message: Some(trade.message.unwrap_or_else(|| "Order placed".to_string())),
            error: None,
            order_id: trade.order_id,
            status: trade.status,
        }
    } else {
        let error = trade
            .error
            .as_ref()
            .map(error_text)
            .unwrap_or_else(|| "Trade failed".to_string());
        OrderResult::failed(error)
    }
}

/// Map a non-2xx trade answer to a failed result.
///
/// FastAPI reports refusals as `{"detail": ...}`; anything else is shown with
/// the status line.
fn refusal_result(status: StatusCode, text: &str) -> OrderResult {
    let error = serde_json::from_str::<ErrorResponse>(text)
        .map(|e| error_text(&e.detail))
        .unwrap_or_else(|_| format!("{} - {}", status, text));
    OrderResult::failed(error)
}

fn order_record(o: OrderRecordResponse) -> OrderRecord {
    let side = o.side.as_deref().and_then(|s| {
        let side = OrderSide::parse(s);
        if side.is_none() {
            warn!(side = %s, "Unknown order side");
        }
        side
    });

    OrderRecord {
        id: o.id.unwrap_or_default(),
        symbol: o.symbol.unwrap_or_default(),
        quantity: o.qty,
        side,
        order_type: o.order_type.unwrap_or_default(),
        status: o.status.unwrap_or_default(),
        filled_at: o.filled_at.as_deref().and_then(parse_timestamp),
        created_at: o.created_at.as_deref().and_then(parse_timestamp),
    }
}

fn insider_signal(t: InsiderTradeResponse) -> Option<InsiderSignal> {
    let symbol = t.symbol.filter(|s| !s.trim().is_empty())?;

    if t.shares <= Decimal::ZERO {
        warn!(symbol = %symbol, shares = %t.shares, "Skipping insider trade without shares acquired");
        return None;
    }
    if let Some(signal) = t.signal.as_deref().filter(|s| !s.eq_ignore_ascii_case("buy")) {
        debug!(symbol = %symbol, signal = %signal, "Skipping non-buy insider trade");
        return None;
    }

    Some(InsiderSignal {
        symbol,
        insider: t.insider.unwrap_or_else(|| "Unknown".to_string()),
        date: t.date.unwrap_or_else(|| "N/A".to_string()),
        shares: t.shares,
        price: t.price,
        cost: t.cost,
        filing_date: t.filing_date.unwrap_or_else(|| "N/A".to_string()),
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
