//! Provider selection and fallback for market data.
//!
//! Domestic symbols go to the primary provider first and fall through to the
//! secondary on any failure. Every other symbol goes to the secondary only.

use std::sync::Arc;

use log::{debug, warn};

use super::error::StockfolioError;
use super::instrument::{is_tradable, normalize_symbol, CompanyInfo, Quote};
use crate::ports::quote_port::QuoteSource;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("{provider} rate limit reached")]
    RateLimited { provider: String },

    #[error("{provider} returned no data for {symbol}")]
    NoData { provider: String, symbol: String },

    #[error("{provider} request failed: {reason}")]
    Upstream { provider: String, reason: String },
}

impl From<QuoteError> for StockfolioError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::NotConfigured { provider, reason } => {
                StockfolioError::ProviderNotConfigured { provider, reason }
            }
            QuoteError::RateLimited { provider } => StockfolioError::RateLimited { provider },
            QuoteError::NoData { symbol, .. } => {
                StockfolioError::not_found(format!("Stock data for {}", symbol))
            }
            QuoteError::Upstream { provider, reason } => StockfolioError::ProviderUnavailable {
                reason: format!("{}: {}", provider, reason),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderRoute {
    Primary,
    Secondary,
}

impl ProviderRoute {
    /// Providers to try for `symbol`, in order.
    pub fn plan(symbol: &str) -> &'static [ProviderRoute] {
        if is_tradable(symbol) {
            &[ProviderRoute::Primary, ProviderRoute::Secondary]
        } else {
            &[ProviderRoute::Secondary]
        }
    }
}

#[derive(Clone)]
pub struct QuoteRouter {
    primary: Arc<dyn QuoteSource>,
    secondary: Arc<dyn QuoteSource>,
}

impl QuoteRouter {
    pub fn new(primary: Arc<dyn QuoteSource>, secondary: Arc<dyn QuoteSource>) -> Self {
        QuoteRouter { primary, secondary }
    }

    fn source(&self, route: ProviderRoute) -> &dyn QuoteSource {
        match route {
            ProviderRoute::Primary => self.primary.as_ref(),
            ProviderRoute::Secondary => self.secondary.as_ref(),
        }
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let symbol = normalize_symbol(symbol);
        let mut last_err = None;
        for route in ProviderRoute::plan(&symbol) {
            let source = self.source(*route);
            match source.fetch_quote(&symbol).await {
                Ok(quote) => {
                    debug!("quote for {} served by {}", symbol, source.name());
                    return Ok(quote);
                }
                Err(e) => {
                    warn!("{} quote failed for {}: {}", source.name(), symbol, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| QuoteError::NoData {
            provider: "none".into(),
            symbol,
        }))
    }

    pub async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, QuoteError> {
        let symbol = normalize_symbol(symbol);
        let mut last_err = None;
        for route in ProviderRoute::plan(&symbol) {
            let source = self.source(*route);
            match source.fetch_company(&symbol).await {
                Ok(info) => return Ok(info),
                Err(e) => {
                    warn!("{} company lookup failed for {}: {}", source.name(), symbol, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| QuoteError::NoData {
            provider: "none".into(),
            symbol,
        }))
    }
}
