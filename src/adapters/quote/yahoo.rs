//! Yahoo Finance quote endpoint, used for NSE-listed symbols.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::upstream;
use crate::domain::instrument::{CompanyInfo, Quote};
use crate::domain::quotes::QuoteError;
use crate::ports::quote_port::QuoteSource;

const PROVIDER: &str = "Yahoo Finance";

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    regular_market_price: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<i64>,
    long_name: Option<String>,
    short_name: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
}

/// Exchange suffix for the National Stock Exchange.
pub fn exchange_symbol(symbol: &str) -> String {
    format!("{}.NS", symbol)
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(4))
}

fn first_result(body: &str, symbol: &str) -> Result<YahooQuote, QuoteError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body).map_err(|e| upstream(PROVIDER, e))?;
    envelope
        .quote_response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| QuoteError::NoData {
            provider: PROVIDER.into(),
            symbol: symbol.to_string(),
        })
}

pub fn parse_quote(body: &str, symbol: &str) -> Result<Quote, QuoteError> {
    let quote = first_result(body, symbol)?;
    let price = quote
        .regular_market_price
        .and_then(to_decimal)
        .ok_or_else(|| QuoteError::NoData {
            provider: PROVIDER.into(),
            symbol: symbol.to_string(),
        })?;
    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        day_high: quote.regular_market_day_high.and_then(to_decimal),
        day_low: quote.regular_market_day_low.and_then(to_decimal),
        volume: quote.regular_market_volume,
        timestamp: Utc::now(),
    })
}

pub fn parse_company(body: &str, symbol: &str) -> Result<CompanyInfo, QuoteError> {
    let quote = first_result(body, symbol)?;
    let company_name = quote
        .long_name
        .or(quote.short_name)
        .unwrap_or_else(|| symbol.to_string());
    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        company_name,
        sector: quote.sector,
        industry: quote.industry,
        description: Some("Company information from Yahoo Finance".to_string()),
    })
}

pub struct YahooSource {
    client: Client,
    base_url: String,
}

impl YahooSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, symbol: &str) -> Result<String, QuoteError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        debug!("GET {} for {}", url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("symbols", exchange_symbol(symbol))])
            .send()
            .await
            .map_err(|e| upstream(PROVIDER, e))?;
        let response = response
            .error_for_status()
            .map_err(|e| upstream(PROVIDER, e))?;
        response.text().await.map_err(|e| upstream(PROVIDER, e))
    }
}

#[async_trait]
impl QuoteSource for YahooSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let body = self.fetch(symbol).await?;
        parse_quote(&body, symbol)
    }

    async fn fetch_company(&self, symbol: &str) -> Result<CompanyInfo, QuoteError> {
        let body = self.fetch(symbol).await?;
        parse_company(&body, symbol)
    }
}
