//! Alpha Vantage GLOBAL_QUOTE and OVERVIEW endpoints.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::upstream;
use crate::domain::instrument::{CompanyInfo, Quote};
use crate::domain::quotes::QuoteError;
use crate::ports::quote_port::QuoteSource;

const PROVIDER: &str = "Alpha Vantage";

#[derive(Debug, Default, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

fn rate_limited() -> QuoteError {
    QuoteError::RateLimited {
        provider: PROVIDER.into(),
    }
}

fn no_data(symbol: &str) -> QuoteError {
    QuoteError::NoData {
        provider: PROVIDER.into(),
        symbol: symbol.to_string(),
    }
}

fn decimal_field(value: Option<&str>) -> Option<Decimal> {
    value.and_then(|v| Decimal::from_str(v.trim()).ok())
}

pub fn parse_global_quote(body: &str, symbol: &str) -> Result<Quote, QuoteError> {
    let response: GlobalQuoteResponse =
        serde_json::from_str(body).map_err(|e| upstream(PROVIDER, e))?;
    let price = response
        .global_quote
        .as_ref()
        .and_then(|q| decimal_field(q.price.as_deref()));
    let Some(price) = price else {
        if response.note.is_some() || response.information.is_some() {
            return Err(rate_limited());
        }
        return Err(no_data(symbol));
    };
    let quote = response.global_quote.unwrap_or_default();
    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        day_high: decimal_field(quote.high.as_deref()),
        day_low: decimal_field(quote.low.as_deref()),
        volume: quote.volume.and_then(|v| v.trim().parse().ok()),
        timestamp: Utc::now(),
    })
}

pub fn parse_overview(body: &str, symbol: &str) -> Result<CompanyInfo, QuoteError> {
    let response: OverviewResponse =
        serde_json::from_str(body).map_err(|e| upstream(PROVIDER, e))?;
    if response.note.is_some() || response.information.is_some() {
        return Err(rate_limited());
    }
    let company_name = response
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| no_data(symbol))?;
    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        company_name,
        sector: response.sector,
        industry: response.industry,
        description: response.description,
    })
}

pub struct AlphaVantageSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageSource {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn call(&self, function: &str, symbol: &str) -> Result<String, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| QuoteError::NotConfigured {
            provider: PROVIDER.into(),
            reason: "set alpha_vantage_api_key in the [quotes] config section".into(),
        })?;
        debug!("{} {} for {}", PROVIDER, function, symbol);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("function", function), ("symbol", symbol), ("apikey", api_key)])
            .send()
            .await
            .map_err(|e| upstream(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| upstream(PROVIDER, e))?;
        response.text().await.map_err(|e| upstream(PROVIDER, e))
    }
}

#[async_trait]
impl QuoteSource for AlphaVantageSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let body = self.call("GLOBAL_QUOTE", symbol).await?;
        parse_global_quote(&body, symbol)
    }

    async fn fetch_company(&self, symbol: &str) -> Result<CompanyInfo, QuoteError> {
        let body = self.call("OVERVIEW", symbol).await?;
        parse_overview(&body, symbol)
    }
}
