//! Portfolio valuation and the client-side price reducer.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::StockfolioError;
use super::holding::{percentage_of, HoldingView};
use super::instrument::PriceUpdate;

/// Aggregate cost basis and market value, the input to goal progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Valuation {
    pub total_cost: Decimal,
    pub current_value: Decimal,
}

impl Valuation {
    pub fn profit(&self) -> Decimal {
        self.current_value - self.total_cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percentage: Decimal,
    pub balance: Decimal,
    pub items: Vec<HoldingView>,
}

impl PortfolioSummary {
    pub fn new(items: Vec<HoldingView>, balance: Decimal) -> Result<Self, StockfolioError> {
        let mut summary = PortfolioSummary {
            total_investment: Decimal::ZERO,
            current_value: Decimal::ZERO,
            profit_loss: Decimal::ZERO,
            profit_loss_percentage: Decimal::ZERO,
            balance,
            items,
        };
        summary.recompute_totals()?;
        Ok(summary)
    }

    pub fn valuation(&self) -> Valuation {
        Valuation {
            total_cost: self.total_investment,
            current_value: self.current_value,
        }
    }

    /// Folds a pushed price into the held items. Returns whether any item matched.
    pub fn apply_price_update(&mut self, update: &PriceUpdate) -> Result<bool, StockfolioError> {
        let mut changed = false;
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.holding.symbol == update.symbol)
        {
            item.reprice(update.current_price)?;
            changed = true;
        }
        if changed {
            self.recompute_totals()?;
        }
        Ok(changed)
    }

    fn recompute_totals(&mut self) -> Result<(), StockfolioError> {
        let total_investment = checked_sum(self.items.iter().map(|i| i.investment))?;
        let current_value = checked_sum(self.items.iter().map(|i| i.current_value))?;
        self.profit_loss_percentage =
            percentage_of(current_value - total_investment, total_investment)?;
        self.profit_loss = current_value - total_investment;
        self.total_investment = total_investment;
        self.current_value = current_value;
        Ok(())
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Result<Decimal, StockfolioError> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| StockfolioError::validation("portfolio total is too large"))
    })
}
