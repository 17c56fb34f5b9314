//! Holdings and their embedded transaction log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StockfolioError;

/// Largest share count a single holding may carry.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest per-share price accepted on orders and edits (10^12).
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// `quantity * price`, or a validation error when it does not fit a `Decimal`.
pub fn notional(quantity: i64, price: Decimal) -> Result<Decimal, StockfolioError> {
    Decimal::from(quantity)
        .checked_mul(price)
        .ok_or_else(|| StockfolioError::validation("amount is too large"))
}

/// Rejects order sizes outside the supported range.
pub fn check_order_bounds(quantity: i64, price: Decimal) -> Result<(), StockfolioError> {
    if quantity > MAX_QUANTITY {
        return Err(StockfolioError::InvalidQuantity {
            reason: format!("quantity must not exceed {}", MAX_QUANTITY),
        });
    }
    if price > MAX_PRICE {
        return Err(StockfolioError::validation(format!(
            "price must not exceed {}",
            MAX_PRICE
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(TransactionKind::Buy),
            "sell" => Some(TransactionKind::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub quantity: i64,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn value(&self) -> Result<Decimal, StockfolioError> {
        notional(self.quantity, self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: i64,
    pub average_buy_price: Decimal,
    pub transactions: Vec<Transaction>,
    pub investment_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Holding {
    /// Opens a position with its first buy.
    pub fn open(user_id: &str, symbol: &str, quantity: i64, price: Decimal, now: DateTime<Utc>) -> Self {
        Holding {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            quantity,
            average_buy_price: price,
            transactions: vec![Transaction {
                kind: TransactionKind::Buy,
                quantity,
                price,
                timestamp: now,
            }],
            investment_date: now,
            last_updated: now,
        }
    }

    /// Merges a buy into the position, recomputing the weighted average cost.
    pub fn record_buy(
        &mut self,
        quantity: i64,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StockfolioError> {
        let new_quantity = self
            .quantity
            .checked_add(quantity)
            .filter(|q| *q <= MAX_QUANTITY)
            .ok_or_else(|| StockfolioError::InvalidQuantity {
                reason: format!("a holding may not exceed {} shares", MAX_QUANTITY),
            })?;
        let total_cost = self
            .investment()?
            .checked_add(notional(quantity, price)?)
            .ok_or_else(|| StockfolioError::validation("amount is too large"))?;
        self.average_buy_price = total_cost / Decimal::from(new_quantity);
        self.quantity = new_quantity;
        self.transactions.push(Transaction {
            kind: TransactionKind::Buy,
            quantity,
            price,
            timestamp: now,
        });
        self.last_updated = now;
        Ok(())
    }

    /// Appends a sell and reduces quantity. Average cost is left untouched.
    /// Returns the sale proceeds.
    pub fn record_sell(
        &mut self,
        quantity: i64,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, StockfolioError> {
        if quantity <= 0 {
            return Err(StockfolioError::InvalidQuantity {
                reason: "quantity must be positive".into(),
            });
        }
        if quantity > self.quantity {
            return Err(StockfolioError::InvalidQuantity {
                reason: format!("cannot sell {} of {} held", quantity, self.quantity),
            });
        }
        let sell = Transaction {
            kind: TransactionKind::Sell,
            quantity,
            price,
            timestamp: now,
        };
        let proceeds = sell.value()?;
        self.transactions.push(sell);
        self.quantity -= quantity;
        self.last_updated = now;
        Ok(proceeds)
    }

    pub fn is_closed(&self) -> bool {
        self.quantity == 0
    }

    pub fn investment(&self) -> Result<Decimal, StockfolioError> {
        notional(self.quantity, self.average_buy_price)
    }

    pub fn market_value(&self, price: Decimal) -> Result<Decimal, StockfolioError> {
        notional(self.quantity, price)
    }

    /// Bought minus sold across the retained log.
    pub fn net_transacted_quantity(&self) -> i64 {
        self.transactions
            .iter()
            .map(|t| match t.kind {
                TransactionKind::Buy => t.quantity,
                TransactionKind::Sell => -t.quantity,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub quantity: i64,
    pub price: Decimal,
    pub value: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A holding joined with the current instrument price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    #[serde(flatten)]
    pub holding: Holding,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub investment: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percentage: Decimal,
    pub transaction_history: Vec<TransactionEntry>,
}

impl HoldingView {
    pub fn new(holding: Holding, current_price: Decimal) -> Result<Self, StockfolioError> {
        let transaction_history = holding
            .transactions
            .iter()
            .map(|t| {
                Ok(TransactionEntry {
                    kind: t.kind,
                    quantity: t.quantity,
                    price: t.price,
                    value: t.value()?,
                    timestamp: t.timestamp,
                })
            })
            .collect::<Result<_, StockfolioError>>()?;
        let mut view = HoldingView {
            holding,
            current_price,
            current_value: Decimal::ZERO,
            investment: Decimal::ZERO,
            profit_loss: Decimal::ZERO,
            profit_loss_percentage: Decimal::ZERO,
            transaction_history,
        };
        view.reprice(current_price)?;
        Ok(view)
    }

    pub fn reprice(&mut self, current_price: Decimal) -> Result<(), StockfolioError> {
        let investment = self.holding.investment()?;
        let current_value = self.holding.market_value(current_price)?;
        self.profit_loss_percentage = percentage_of(current_value - investment, investment)?;
        self.profit_loss = current_value - investment;
        self.investment = investment;
        self.current_value = current_value;
        self.current_price = current_price;
        Ok(())
    }
}

/// `part / whole * 100`, defined as zero when `whole` is zero.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Result<Decimal, StockfolioError> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(4))
        .ok_or_else(|| StockfolioError::validation("percentage is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_holding() -> Holding {
        Holding::open("user-1", "INFY", 5, dec!(100), Utc::now())
    }

    #[test]
    fn open_records_first_buy() {
        let holding = sample_holding();
        assert_eq!(holding.quantity, 5);
        assert_eq!(holding.average_buy_price, dec!(100));
        assert_eq!(holding.transactions.len(), 1);
        assert_eq!(holding.transactions[0].kind, TransactionKind::Buy);
    }

    #[test]
    fn record_buy_weights_average_cost() {
        let mut holding = sample_holding();
        holding.record_buy(5, dec!(200), Utc::now()).unwrap();
        assert_eq!(holding.quantity, 10);
        assert_eq!(holding.average_buy_price, dec!(150));
        assert_eq!(holding.transactions.len(), 2);
    }

    #[test]
    fn record_sell_keeps_average_cost() {
        let mut holding = sample_holding();
        let proceeds = holding.record_sell(2, dec!(130), Utc::now()).unwrap();
        assert_eq!(proceeds, dec!(260));
        assert_eq!(holding.quantity, 3);
        assert_eq!(holding.average_buy_price, dec!(100));
        assert!(!holding.is_closed());
    }

    #[test]
    fn record_sell_everything_closes() {
        let mut holding = sample_holding();
        holding.record_sell(5, dec!(90), Utc::now()).unwrap();
        assert!(holding.is_closed());
    }

    #[test]
    fn record_sell_rejects_bad_quantities() {
        let mut holding = sample_holding();
        assert!(matches!(
            holding.record_sell(0, dec!(100), Utc::now()),
            Err(StockfolioError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            holding.record_sell(6, dec!(100), Utc::now()),
            Err(StockfolioError::InvalidQuantity { .. })
        ));
        assert_eq!(holding.quantity, 5);
        assert_eq!(holding.transactions.len(), 1);
    }

    #[test]
    fn quantity_matches_transaction_log() {
        let mut holding = sample_holding();
        holding.record_buy(7, dec!(110), Utc::now()).unwrap();
        holding.record_sell(4, dec!(120), Utc::now()).unwrap();
        assert_eq!(holding.quantity, holding.net_transacted_quantity());
    }

    #[test]
    fn view_computes_profit_and_loss() {
        let view = HoldingView::new(sample_holding(), dec!(120)).unwrap();
        assert_eq!(view.investment, dec!(500));
        assert_eq!(view.current_value, dec!(600));
        assert_eq!(view.profit_loss, dec!(100));
        assert_eq!(view.profit_loss_percentage, dec!(20));
        assert_eq!(view.transaction_history[0].value, dec!(500));
    }

    #[test]
    fn view_percentage_is_zero_without_investment() {
        let mut holding = sample_holding();
        holding.average_buy_price = Decimal::ZERO;
        let view = HoldingView::new(holding, dec!(120)).unwrap();
        assert_eq!(view.investment, Decimal::ZERO);
        assert_eq!(view.profit_loss_percentage, Decimal::ZERO);
    }

    #[test]
    fn max_price_is_one_trillion() {
        assert_eq!(MAX_PRICE, Decimal::from(1_000_000_000_000i64));
    }

    #[test]
    fn record_buy_rejects_oversized_position() {
        let mut holding = sample_holding();
        assert!(matches!(
            holding.record_buy(i64::MAX, dec!(1), Utc::now()),
            Err(StockfolioError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            holding.record_buy(MAX_QUANTITY, dec!(1), Utc::now()),
            Err(StockfolioError::InvalidQuantity { .. })
        ));
        assert_eq!(holding.quantity, 5);
        assert_eq!(holding.transactions.len(), 1);
    }

    #[test]
    fn oversized_stored_values_error_instead_of_panicking() {
        let mut holding = sample_holding();
        holding.quantity = i64::MAX;
        holding.average_buy_price = Decimal::MAX;
        assert!(matches!(
            holding.investment(),
            Err(StockfolioError::Validation { .. })
        ));
        assert!(HoldingView::new(holding, dec!(100)).is_err());
    }

    #[test]
    fn percentage_of_tiny_base_is_an_error() {
        assert!(percentage_of(Decimal::MAX, Decimal::new(1, 28)).is_err());
        assert_eq!(percentage_of(dec!(5), Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn view_serializes_flat() {
        let view = HoldingView::new(sample_holding(), dec!(100)).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["symbol"], "INFY");
        assert!(json.get("averageBuyPrice").is_some());
        assert!(json.get("profitLossPercentage").is_some());
        assert_eq!(json["transactions"][0]["type"], "buy");
    }

    #[test]
    fn transaction_kind_parse_roundtrip() {
        for kind in [TransactionKind::Buy, TransactionKind::Sell] {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse("hold"), None);
    }
}
