//! Wire types for the dashboard backend's paper-trading endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::OrderSide;

/// Response from `GET /api/portfolio`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub account: Option<AccountResponse>,
    #[serde(default)]
    pub positions: Vec<PositionResponse>,
}

/// Position entry inside the portfolio response.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionResponse {
    pub symbol: String,
    #[serde(default)]
    pub qty: Decimal,
    #[serde(default)]
    pub avg_entry_price: Decimal,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub market_value: Decimal,
    #[serde(default)]
    pub unrealized_pl: Decimal,
    /// Already scaled to percent by the backend
    #[serde(default)]
    pub unrealized_plpc: Decimal,
}

/// Account object inside the portfolio response.
///
/// The backend reports broker failures in-band as `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    #[serde(default)]
    pub buying_power: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub portfolio_value: Decimal,
    #[serde(default)]
    pub equity: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for `POST /api/trade`.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRequest {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    pub side: OrderSide,
}

/// Successful (2xx) response from `POST /api/trade`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// String or structured broker error
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub detail: serde_json::Value,
}

/// Response from `GET /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub orders: Vec<OrderRecordResponse>,
}

/// Order entry inside the orders response.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecordResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filled_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response from `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub api_configured: bool,
    #[serde(default)]
    pub watchlist_count: u32,
}

/// Response from `GET /api/insider-trades`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsiderTradesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub data: Vec<InsiderTradeResponse>,
}

/// Insider purchase entry inside the insider-trades response.
#[derive(Debug, Clone, Deserialize)]
pub struct InsiderTradeResponse {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub insider: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub shares: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub filing_date: Option<String>,
    /// "Buy" for every entry the backend currently emits
    #[serde(default)]
    pub signal: Option<String>,
}

/// Response from `GET /api/watchlist`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistResponse {
    #[serde(default)]
    pub watchlist: Vec<String>,
}

/// Render a backend error payload as display text.
///
/// Plain strings pass through untouched; structured payloads are shown as JSON.
pub fn error_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_portfolio() {
        let body = r#"{
            "success": true,
            "account": {"buying_power": 19800.5, "cash": 9900.25, "portfolio_value": 10050, "equity": 10050, "status": "ACTIVE"},
            "positions": [
                {"symbol": "NVDA", "qty": 0.5, "avg_entry_price": 120.0, "current_price": 130.0,
                 "market_value": 65.0, "unrealized_pl": 5.0, "unrealized_plpc": 8.333}
            ]
        }"#;

        let resp: PortfolioResponse = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.positions.len(), 1);
        assert_eq!(resp.positions[0].qty, dec!(0.5));
        assert_eq!(resp.positions[0].market_value, dec!(65));
        assert_eq!(resp.account.unwrap().status, "ACTIVE");
    }

    #[test]
    fn test_parse_account_error_in_band() {
        let body = r#"{"success": true, "account": {"error": "401 Unauthorized"}, "positions": []}"#;

        let resp: PortfolioResponse = serde_json::from_str(body).unwrap();
        let account = resp.account.unwrap();
        assert_eq!(account.error.as_deref(), Some("401 Unauthorized"));
        assert_eq!(account.cash, Decimal::ZERO);
    }

    #[test]
    fn test_trade_request_sends_numeric_qty() {
        let req = TradeRequest {
            symbol: "NVDA".to_string(),
            qty: dec!(1.5),
            side: OrderSide::Buy,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["qty"], serde_json::json!(1.5));
        assert_eq!(json["side"], "buy");
    }

    #[test]
    fn test_parse_insider_trades() {
        let body = r#"{"success": true, "count": 2, "data": [
            {"symbol": "NVDA", "insider": "Jensen Huang", "date": "2026-01-15", "shares": 50000,
             "price": 142.5, "cost": 7125000.0, "filing_date": "2026-01-17", "signal": "Buy"},
            {"symbol": "AAPL", "insider": "Unknown", "date": "N/A", "shares": 25000,
             "price": 185.2, "cost": 4630000.0, "filing_date": "N/A", "signal": "Buy"}
        ]}"#;

        let resp: InsiderTradesResponse = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.count, 2);
        assert_eq!(resp.data[0].shares, dec!(50000));
        assert_eq!(resp.data[0].price, dec!(142.5));
        assert_eq!(resp.data[1].date.as_deref(), Some("N/A"));
        assert_eq!(resp.data[1].signal.as_deref(), Some("Buy"));
    }

    #[test]
    fn test_parse_watchlist() {
        let resp: WatchlistResponse =
            serde_json::from_str(r#"{"watchlist": ["AAPL", "MSFT", "NVDA"]}"#).unwrap();
        assert_eq!(resp.watchlist, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn test_error_text() {
        assert_eq!(error_text(&serde_json::json!("Trade failed")), "Trade failed");
        assert_eq!(
            error_text(&serde_json::json!({"code": 40310000, "message": "insufficient qty"})),
            r#"{"code":40310000,"message":"insufficient qty"}"#
        );
    }
}
