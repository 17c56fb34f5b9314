//! Position book: per-user holdings, trades and valuation.
//!
//! Every trade takes the user's ledger lock for its whole read-modify-write so
//! concurrent buys and sells against one account cannot interleave.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StockfolioError;
use super::holding::{check_order_bounds, notional, Holding, HoldingView};
use super::instrument::{is_tradable, normalize_symbol};
use super::ledger::{Ledger, UserLocks, MINIMUM_AMOUNT};
use super::portfolio::PortfolioSummary;
use super::user::User;
use crate::ports::store_port::StorePort;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOutcome {
    pub holding: Holding,
    pub new_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOutcome {
    pub sale_value: Decimal,
    pub new_balance: Decimal,
    pub remaining_quantity: i64,
}

/// Direct owner edit of a holding; no balance side effects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEdit {
    pub quantity: Option<i64>,
    pub average_buy_price: Option<Decimal>,
}

pub struct PositionBook {
    store: Arc<dyn StorePort>,
    ledger: Arc<Ledger>,
    locks: Arc<UserLocks>,
}

impl PositionBook {
    pub fn new(store: Arc<dyn StorePort>, ledger: Arc<Ledger>, locks: Arc<UserLocks>) -> Self {
        PositionBook {
            store,
            ledger,
            locks,
        }
    }

    fn price_or(&self, symbol: &str, fallback: Decimal) -> Result<Decimal, StockfolioError> {
        Ok(self
            .store
            .find_instrument(symbol)?
            .map(|i| i.current_price)
            .unwrap_or(fallback))
    }

    pub fn list_holdings(&self, user: &User) -> Result<Vec<HoldingView>, StockfolioError> {
        self.store
            .list_holdings(&user.id)?
            .into_iter()
            .map(|holding| {
                let price = self.price_or(&holding.symbol, holding.average_buy_price)?;
                HoldingView::new(holding, price)
            })
            .collect()
    }

    pub fn summary(&self, user: &User) -> Result<PortfolioSummary, StockfolioError> {
        let items = self.list_holdings(user)?;
        let balance = self.ledger.balance(&user.id)?;
        PortfolioSummary::new(items, balance)
    }

    pub fn buy(
        &self,
        user: &User,
        symbol: &str,
        quantity: i64,
        price: Decimal,
    ) -> Result<BuyOutcome, StockfolioError> {
        let symbol = normalize_symbol(symbol);
        if !is_tradable(&symbol) {
            return Err(StockfolioError::InvalidSymbol { symbol });
        }
        if quantity <= 0 {
            return Err(StockfolioError::InvalidQuantity {
                reason: "quantity must be a positive whole number".into(),
            });
        }
        if price <= Decimal::ZERO {
            return Err(StockfolioError::validation("price must be positive"));
        }
        check_order_bounds(quantity, price)?;
        let cost = notional(quantity, price)?;
        if cost < MINIMUM_AMOUNT {
            return Err(StockfolioError::BelowMinimum {
                minimum: MINIMUM_AMOUNT,
            });
        }

        self.locks.run(&user.id, || {
            let available = self.ledger.balance(&user.id)?;
            if cost > available {
                return Err(StockfolioError::InsufficientFunds {
                    required: cost,
                    available,
                });
            }
            let now = Utc::now();
            let holding = match self.store.find_holding_by_symbol(&user.id, &symbol)? {
                Some(mut existing) => {
                    existing.record_buy(quantity, price, now)?;
                    existing
                }
                None => Holding::open(&user.id, &symbol, quantity, price, now),
            };
            self.store.save_holding(&holding)?;
            let new_balance = self.ledger.debit(&user.id, cost)?;
            info!("user {} bought {} {} @ {}", user.id, quantity, symbol, price);
            Ok(BuyOutcome {
                holding,
                new_balance,
            })
        })
    }

    fn owned_holding(&self, user: &User, holding_id: &str) -> Result<Holding, StockfolioError> {
        let holding = self
            .store
            .find_holding(holding_id)?
            .ok_or_else(|| StockfolioError::not_found("Portfolio item"))?;
        if holding.user_id != user.id {
            return Err(StockfolioError::forbidden(
                "Not authorized to access this portfolio item",
            ));
        }
        Ok(holding)
    }

    /// Sells the whole position at the current price, or at average cost when
    /// the instrument has no cached price.
    pub fn sell_all(&self, user: &User, holding_id: &str) -> Result<SaleOutcome, StockfolioError> {
        self.locks.run(&user.id, || {
            let mut holding = self.owned_holding(user, holding_id)?;
            let price = self.price_or(&holding.symbol, holding.average_buy_price)?;
            let quantity = holding.quantity;
            let sale_value = holding.record_sell(quantity, price, Utc::now())?;
            self.store.save_holding(&holding)?;
            let new_balance = self.ledger.credit(&user.id, sale_value)?;
            self.store.delete_holding(&holding.id)?;
            info!("user {} sold all {} {} @ {}", user.id, quantity, holding.symbol, price);
            Ok(SaleOutcome {
                sale_value,
                new_balance,
                remaining_quantity: 0,
            })
        })
    }

    pub fn sell_partial(
        &self,
        user: &User,
        holding_id: &str,
        quantity: i64,
    ) -> Result<SaleOutcome, StockfolioError> {
        self.locks.run(&user.id, || {
            let mut holding = self.owned_holding(user, holding_id)?;
            let price = self
                .store
                .find_instrument(&holding.symbol)?
                .map(|i| i.current_price)
                .ok_or_else(|| StockfolioError::not_found("Current stock price"))?;
            let sale_value = holding.record_sell(quantity, price, Utc::now())?;
            if holding.is_closed() {
                self.store.save_holding(&holding)?;
                let new_balance = self.ledger.credit(&user.id, sale_value)?;
                self.store.delete_holding(&holding.id)?;
                return Ok(SaleOutcome {
                    sale_value,
                    new_balance,
                    remaining_quantity: 0,
                });
            }
            self.store.save_holding(&holding)?;
            let new_balance = self.ledger.credit(&user.id, sale_value)?;
            info!(
                "user {} sold {} {} @ {}, {} left",
                user.id, quantity, holding.symbol, price, holding.quantity
            );
            Ok(SaleOutcome {
                sale_value,
                new_balance,
                remaining_quantity: holding.quantity,
            })
        })
    }

    pub fn update_holding(
        &self,
        user: &User,
        holding_id: &str,
        edit: &HoldingEdit,
    ) -> Result<Holding, StockfolioError> {
        if edit.quantity.is_some_and(|q| q <= 0) {
            return Err(StockfolioError::InvalidQuantity {
                reason: "quantity must be a positive whole number".into(),
            });
        }
        if edit.average_buy_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(StockfolioError::validation("average buy price must be positive"));
        }
        check_order_bounds(
            edit.quantity.unwrap_or(1),
            edit.average_buy_price.unwrap_or(Decimal::ONE),
        )?;
        self.locks.run(&user.id, || {
            let mut holding = self.owned_holding(user, holding_id)?;
            if let Some(quantity) = edit.quantity {
                holding.quantity = quantity;
            }
            if let Some(price) = edit.average_buy_price {
                holding.average_buy_price = price;
            }
            holding.last_updated = Utc::now();
            self.store.save_holding(&holding)?;
            Ok(holding)
        })
    }
}
