//! Order model: proposed buy/sell requests and broker outcomes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an order was refused locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Missing symbol, non-positive or non-numeric quantity, unknown side
    InvalidOrder(String),
    /// Buy attempted with no allowance left
    BudgetExhausted { budget: Decimal },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidOrder(detail) => write!(f, "Invalid order: {}", detail),
            RejectReason::BudgetExhausted { budget } => write!(
                f,
                "No budget remaining! You've spent your ${}.",
                budget.normalize()
            ),
        }
    }
}

/// A proposed order, checked by the ledger before it is sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Ticker symbol, normalised to uppercase
    pub symbol: String,

    /// Shares to trade; must be strictly positive
    pub quantity: Decimal,

    pub side: OrderSide,
}

impl OrderRequest {
    pub fn new(symbol: &str, quantity: Decimal, side: OrderSide) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            quantity,
            side,
        }
    }

    pub fn buy(symbol: &str, quantity: Decimal) -> Self {
        Self::new(symbol, quantity, OrderSide::Buy)
    }

    pub fn sell(symbol: &str, quantity: Decimal) -> Self {
        Self::new(symbol, quantity, OrderSide::Sell)
    }

    /// Build an order from raw user input.
    ///
    /// Anything that cannot become a well-formed order is reported as
    /// [`RejectReason::InvalidOrder`].
    pub fn from_input(symbol: &str, quantity: &str, side: &str) -> Result<Self, RejectReason> {
        let side = OrderSide::parse(side).ok_or_else(|| {
            RejectReason::InvalidOrder(format!("Side must be 'buy' or 'sell', got '{}'", side))
        })?;

        let quantity = Decimal::from_str(quantity.trim()).map_err(|_| {
            RejectReason::InvalidOrder(format!("Quantity is not a number: '{}'", quantity))
        })?;

        let order = Self::new(symbol, quantity, side);
        order.validate()?;
        Ok(order)
    }

    /// Check the shape of the order (non-empty symbol, positive quantity).
    pub fn validate(&self) -> Result<(), RejectReason> {
        if self.symbol.trim().is_empty() {
            return Err(RejectReason::InvalidOrder("Symbol is required".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(RejectReason::InvalidOrder(format!(
                "Quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Outcome of an order as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub success: bool,

    /// Present when `success` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Present when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Broker order id, when the broker reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Broker order status, when the broker reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl OrderResult {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            order_id: None,
            status: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            order_id: None,
            status: None,
        }
    }
}

impl std::fmt::Display for OrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.success {
            write!(f, "{}", self.message.as_deref().unwrap_or("Order placed"))?;
            if let Some(id) = &self.order_id {
                write!(f, " (order {}", id)?;
                if let Some(status) = &self.status {
                    write!(f, ", {}", status)?;
                }
                write!(f, ")")?;
            }
            Ok(())
        } else {
            write!(f, "Trade failed: {}", self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_input_normalises_symbol() {
        let order = OrderRequest::from_input(" nvda ", "1.5", "BUY").unwrap();

        assert_eq!(order.symbol, "NVDA");
        assert_eq!(order.quantity, dec!(1.5));
        assert_eq!(order.side, OrderSide::Buy);
    }

    #[test]
    fn test_from_input_rejects_malformed() {
        let cases = [
            ("", "5", "buy"),
            ("NVDA", "abc", "buy"),
            ("NVDA", "0", "sell"),
            ("NVDA", "-2", "buy"),
            ("NVDA", "1", "short"),
        ];

        for (symbol, qty, side) in cases {
            let result = OrderRequest::from_input(symbol, qty, side);
            assert!(
                matches!(result, Err(RejectReason::InvalidOrder(_))),
                "expected InvalidOrder for {:?}",
                (symbol, qty, side)
            );
        }
    }

    #[test]
    fn test_reject_reason_messages() {
        let err = OrderRequest::from_input("  ", "1", "buy").unwrap_err();
        assert_eq!(err.to_string(), "Invalid order: Symbol is required");

        let err = RejectReason::BudgetExhausted { budget: dec!(250.00) };
        assert_eq!(err.to_string(), "No budget remaining! You've spent your $250.");
    }

    #[test]
    fn test_order_result_display() {
        let mut ok = OrderResult::accepted("Order placed: BUY 1 shares of NVDA");
        ok.order_id = Some("abc".to_string());
        ok.status = Some("accepted".to_string());
        assert_eq!(
            ok.to_string(),
            "Order placed: BUY 1 shares of NVDA (order abc, accepted)"
        );

        let failed = OrderResult::failed("insufficient qty");
        assert_eq!(failed.to_string(), "Trade failed: insufficient qty");
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"sell\"");
    }
}
