//! HTTP market-data providers.

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageSource;
pub use yahoo::YahooSource;

use std::time::Duration;

use reqwest::Client;

use crate::domain::error::StockfolioError;
use crate::domain::quotes::QuoteError;

pub fn http_client(timeout: Duration) -> Result<Client, StockfolioError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("stockfolio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StockfolioError::Internal {
            reason: format!("failed to build HTTP client: {}", e),
        })
}

pub(crate) fn upstream(provider: &str, err: impl std::fmt::Display) -> QuoteError {
    QuoteError::Upstream {
        provider: provider.to_string(),
        reason: err.to_string(),
    }
}
