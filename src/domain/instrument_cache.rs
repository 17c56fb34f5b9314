//! Instrument cache: live lookups with fallback to the last stored quote.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::StockfolioError;
use super::holding::MAX_PRICE;
use super::instrument::{normalize_symbol, Instrument, Quote};
use super::quotes::{QuoteError, QuoteRouter};
use crate::ports::store_port::StorePort;

/// Admin-supplied instrument record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInput {
    pub symbol: Option<String>,
    pub company_name: Option<String>,
    pub current_price: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<i64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

pub struct InstrumentCache {
    store: Arc<dyn StorePort>,
    router: QuoteRouter,
}

impl InstrumentCache {
    pub fn new(store: Arc<dyn StorePort>, router: QuoteRouter) -> Self {
        InstrumentCache { store, router }
    }

    pub fn router(&self) -> &QuoteRouter {
        &self.router
    }

    /// Live quote and company profile, fetched together. Falls back to the
    /// stored record (flagged `cached`) when the providers fail.
    pub async fn lookup(&self, symbol: &str) -> Result<Instrument, StockfolioError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(StockfolioError::missing("symbol"));
        }
        let (quote, info) = tokio::join!(
            self.router.quote(&symbol),
            self.router.company_info(&symbol)
        );
        let stored = self.store.find_instrument(&symbol)?;
        let err = match (quote, info) {
            (Ok(quote), Ok(info)) => {
                let instrument = Instrument::from_market_data(&quote, &info);
                self.store.upsert_instrument(&instrument)?;
                return Ok(instrument);
            }
            (Ok(quote), Err(e)) => match stored.clone() {
                Some(mut instrument) => {
                    warn!("company lookup for {} failed, keeping stored profile: {}", symbol, e);
                    instrument.apply_quote(&quote);
                    self.store.upsert_instrument(&instrument)?;
                    return Ok(instrument);
                }
                None => e,
            },
            (Err(e), _) => e,
        };
        if matches!(err, QuoteError::NotConfigured { .. }) {
            return Err(err.into());
        }
        match stored {
            Some(mut instrument) => {
                warn!("serving cached {} after provider failure: {}", symbol, err);
                instrument.cached = true;
                Ok(instrument)
            }
            None => Err(err.into()),
        }
    }

    /// Live quote only; the symbol must already be cached.
    pub async fn refresh_price(&self, symbol: &str) -> Result<Instrument, StockfolioError> {
        let symbol = normalize_symbol(symbol);
        let mut instrument = self
            .store
            .find_instrument(&symbol)?
            .ok_or_else(|| StockfolioError::not_found("Stock"))?;
        let quote = self.router.quote(&symbol).await?;
        instrument.apply_quote(&quote);
        self.store.upsert_instrument(&instrument)?;
        Ok(instrument)
    }

    pub fn list(&self) -> Result<Vec<Instrument>, StockfolioError> {
        self.store.list_instruments()
    }

    pub fn get_cached(&self, symbol: &str) -> Result<Instrument, StockfolioError> {
        self.store
            .find_instrument(&normalize_symbol(symbol))?
            .ok_or_else(|| StockfolioError::not_found("Stock"))
    }

    /// Returns the stored record and whether it was newly created.
    pub fn upsert(&self, input: InstrumentInput) -> Result<(Instrument, bool), StockfolioError> {
        let symbol = input
            .symbol
            .as_deref()
            .map(normalize_symbol)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StockfolioError::missing("symbol"))?;
        let company_name = input
            .company_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StockfolioError::missing("companyName"))?;
        let current_price = input.current_price.unwrap_or(Decimal::ZERO);
        if current_price < Decimal::ZERO {
            return Err(StockfolioError::validation("price must not be negative"));
        }
        if current_price > MAX_PRICE {
            return Err(StockfolioError::validation(format!(
                "price must not exceed {}",
                MAX_PRICE
            )));
        }
        let created = self.store.find_instrument(&symbol)?.is_none();
        let instrument = Instrument {
            symbol,
            company_name,
            current_price,
            day_high: input.day_high,
            day_low: input.day_low,
            volume: input.volume,
            sector: input.sector,
            industry: input.industry,
            description: input.description,
            last_updated: Utc::now(),
            cached: false,
        };
        self.store.upsert_instrument(&instrument)?;
        info!(
            "{} instrument {}",
            if created { "created" } else { "updated" },
            instrument.symbol
        );
        Ok((instrument, created))
    }

    pub fn delete(&self, symbol: &str) -> Result<(), StockfolioError> {
        if !self.store.delete_instrument(&normalize_symbol(symbol))? {
            return Err(StockfolioError::not_found("Stock"));
        }
        Ok(())
    }

    /// Writes a refreshed quote back. `None` when the symbol has been removed.
    pub fn apply_quote(&self, quote: &Quote) -> Result<Option<Instrument>, StockfolioError> {
        let symbol = normalize_symbol(&quote.symbol);
        let Some(mut instrument) = self.store.find_instrument(&symbol)? else {
            return Ok(None);
        };
        instrument.apply_quote(quote);
        self.store.upsert_instrument(&instrument)?;
        Ok(Some(instrument))
    }
}
