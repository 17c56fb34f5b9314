//! Runtime settings assembled from configuration.
//!
//! Every value is validated up front so the server never starts with a
//! half-usable configuration.

use std::time::Duration;

use crate::domain::error::StockfolioError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const MIN_SECRET_LEN: usize = 16;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub path: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSettings {
    pub alpha_vantage_api_key: Option<String>,
    pub alpha_vantage_url: String,
    pub yahoo_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        RefreshSettings {
            enabled: true,
            interval: Duration::from_secs(300),
            batch_size: 5,
            batch_delay: Duration::from_secs(60),
        }
    }
}

impl RefreshSettings {
    /// Same cycle with no pause between batches.
    pub fn without_batch_delay(self) -> Self {
        RefreshSettings {
            batch_delay: Duration::ZERO,
            ..self
        }
    }
}

impl std::fmt::Display for RefreshSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "every {}s, batches of {}, {}s between batches",
            self.interval.as_secs(),
            self.batch_size,
            self.batch_delay.as_secs()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub listen: String,
    pub auth: AuthSettings,
    pub quotes: QuoteSettings,
    pub refresh: RefreshSettings,
    pub webhook_url: Option<String>,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockfolioError> {
        Ok(Settings {
            database: database_settings(config)?,
            listen: config
                .get_string("web", "listen")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            auth: auth_settings(config)?,
            quotes: quote_settings(config)?,
            refresh: refresh_settings(config)?,
            webhook_url: config.get_string("notify", "webhook_url"),
        })
    }
}

fn database_settings(config: &dyn ConfigPort) -> Result<DatabaseSettings, StockfolioError> {
    let path = config
        .get_string("database", "path")
        .ok_or_else(|| missing("database", "path"))?;
    let pool_size = positive(config, "database", "pool_size", 8)?;
    Ok(DatabaseSettings {
        path,
        pool_size: u32::try_from(pool_size).map_err(|_| invalid("database", "pool_size", "too large"))?,
    })
}

fn auth_settings(config: &dyn ConfigPort) -> Result<AuthSettings, StockfolioError> {
    let jwt_secret = config
        .get_string("auth", "jwt_secret")
        .ok_or_else(|| missing("auth", "jwt_secret"))?;
    if jwt_secret.len() < MIN_SECRET_LEN {
        return Err(invalid(
            "auth",
            "jwt_secret",
            &format!("must be at least {} characters", MIN_SECRET_LEN),
        ));
    }
    let token_ttl_hours = positive(config, "auth", "token_ttl_hours", 24)?;
    if token_ttl_hours > MAX_TOKEN_TTL_HOURS {
        return Err(invalid(
            "auth",
            "token_ttl_hours",
            &format!("must not exceed {}", MAX_TOKEN_TTL_HOURS),
        ));
    }
    Ok(AuthSettings {
        jwt_secret,
        token_ttl_hours,
    })
}

fn quote_settings(config: &dyn ConfigPort) -> Result<QuoteSettings, StockfolioError> {
    let timeout_secs = positive(config, "quotes", "timeout_secs", 10)?;
    Ok(QuoteSettings {
        alpha_vantage_api_key: config.get_string("quotes", "alpha_vantage_api_key"),
        alpha_vantage_url: config
            .get_string("quotes", "alpha_vantage_url")
            .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_URL.to_string()),
        yahoo_url: config
            .get_string("quotes", "yahoo_url")
            .unwrap_or_else(|| DEFAULT_YAHOO_URL.to_string()),
        timeout: Duration::from_secs(timeout_secs as u64),
    })
}

fn refresh_settings(config: &dyn ConfigPort) -> Result<RefreshSettings, StockfolioError> {
    let defaults = RefreshSettings::default();
    let interval = positive(config, "refresh", "interval_secs", defaults.interval.as_secs() as i64)?;
    let batch_size = positive(config, "refresh", "batch_size", defaults.batch_size as i64)?;
    let batch_delay = config.get_int(
        "refresh",
        "batch_delay_secs",
        defaults.batch_delay.as_secs() as i64,
    );
    if batch_delay < 0 {
        return Err(invalid("refresh", "batch_delay_secs", "must be non-negative"));
    }
    Ok(RefreshSettings {
        enabled: config.get_bool("refresh", "enabled", defaults.enabled),
        interval: Duration::from_secs(interval as u64),
        batch_size: batch_size as usize,
        batch_delay: Duration::from_secs(batch_delay as u64),
    })
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, StockfolioError> {
    let value = config.get_int(section, key, default);
    if value <= 0 {
        return Err(invalid(section, key, "must be positive"));
    }
    Ok(value)
}

fn missing(section: &str, key: &str) -> StockfolioError {
    StockfolioError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> StockfolioError {
    StockfolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
