//! Tradable instruments, quotes and the domestic allowlist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domestic symbols: routed to the primary provider and the only ones users may buy.
pub const TRADABLE_SYMBOLS: [&str; 30] = [
    "RELIANCE", "TCS", "INFY", "HDFCBANK", "ICICIBANK", "HINDUNILVR", "BHARTIARTL", "SBIN",
    "BAJFINANCE", "WIPRO", "LT", "AXISBANK", "ASIANPAINT", "MARUTI", "KOTAKBANK", "TATAMOTORS",
    "SUNPHARMA", "NESTLEIND", "TITAN", "BAJAJFINSV", "ULTRACEMCO", "TECHM", "NTPC", "POWERGRID",
    "HCLTECH", "ITC", "M&M", "TATASTEEL", "ONGC", "ADANIENT",
];

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub fn is_tradable(symbol: &str) -> bool {
    let symbol = normalize_symbol(symbol);
    TRADABLE_SYMBOLS.contains(&symbol.as_str())
}

/// Point-in-time market snapshot from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyInfo {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub company_name: String,
    pub current_price: Decimal,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<i64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub last_updated: DateTime<Utc>,
    /// Set when this record was served from the cache instead of a live fetch.
    pub cached: bool,
}

impl Instrument {
    pub fn from_market_data(quote: &Quote, info: &CompanyInfo) -> Self {
        Instrument {
            symbol: normalize_symbol(&quote.symbol),
            company_name: info.company_name.clone(),
            current_price: quote.price,
            day_high: quote.day_high,
            day_low: quote.day_low,
            volume: quote.volume,
            sector: info.sector.clone(),
            industry: info.industry.clone(),
            description: info.description.clone(),
            last_updated: quote.timestamp,
            cached: false,
        }
    }

    pub fn apply_quote(&mut self, quote: &Quote) {
        self.current_price = quote.price;
        self.day_high = quote.day_high;
        self.day_low = quote.day_low;
        self.volume = quote.volume;
        self.last_updated = quote.timestamp;
        self.cached = false;
    }
}

/// Payload of a `STOCK_UPDATE` push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub current_price: Decimal,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

impl From<&Instrument> for PriceUpdate {
    fn from(instrument: &Instrument) -> Self {
        PriceUpdate {
            symbol: instrument.symbol.clone(),
            current_price: instrument.current_price,
            day_high: instrument.day_high,
            day_low: instrument.day_low,
            volume: instrument.volume,
            last_updated: instrument.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: i64) -> Quote {
        Quote {
            symbol: "infy".into(),
            price: Decimal::from(price),
            day_high: Some(Decimal::from(price + 5)),
            day_low: Some(Decimal::from(price - 5)),
            volume: Some(1_000),
            timestamp: Utc::now(),
        }
    }

    fn info() -> CompanyInfo {
        CompanyInfo {
            symbol: "INFY".into(),
            company_name: "Infosys Limited".into(),
            sector: Some("Technology".into()),
            industry: None,
            description: None,
        }
    }

    #[test]
    fn tradable_membership() {
        assert!(is_tradable("RELIANCE"));
        assert!(!is_tradable("NOTASYMBOL"));
    }

    #[test]
    fn tradable_is_case_insensitive() {
        assert!(is_tradable("reliance"));
        assert!(is_tradable(" m&m "));
    }

    #[test]
    fn from_market_data_uppercases_symbol() {
        let instrument = Instrument::from_market_data(&quote(1500), &info());
        assert_eq!(instrument.symbol, "INFY");
        assert_eq!(instrument.company_name, "Infosys Limited");
        assert!(!instrument.cached);
    }

    #[test]
    fn apply_quote_clears_cached_flag() {
        let mut instrument = Instrument::from_market_data(&quote(1500), &info());
        instrument.cached = true;
        instrument.apply_quote(&quote(1600));
        assert_eq!(instrument.current_price, Decimal::from(1600));
        assert_eq!(instrument.day_high, Some(Decimal::from(1605)));
        assert!(!instrument.cached);
    }

    #[test]
    fn price_update_carries_refresh_fields() {
        let instrument = Instrument::from_market_data(&quote(1500), &info());
        let update = PriceUpdate::from(&instrument);
        assert_eq!(update.symbol, "INFY");
        assert_eq!(update.current_price, Decimal::from(1500));
        assert_eq!(update.volume, Some(1_000));
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("currentPrice").is_some());
        assert!(json.get("lastUpdated").is_some());
    }
}
