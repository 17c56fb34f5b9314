//! Domain error types.

use rust_decimal::Decimal;

/// Top-level error type for stockfolio.
#[derive(Debug, thiserror::Error)]
pub enum StockfolioError {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("minimum amount is {minimum}")]
    InvalidAmount { minimum: Decimal },

    #[error("insufficient balance. Required: {required}, Available: {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("invalid stock symbol. \"{symbol}\" is not a valid stock")]
    InvalidSymbol { symbol: String },

    #[error("minimum purchase amount is {minimum}")]
    BelowMinimum { minimum: Decimal },

    #[error("invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    #[error("{reason}")]
    Unauthorized { reason: String },

    #[error("{reason}")]
    Forbidden { reason: String },

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("{reason}")]
    Conflict { reason: String },

    #[error("{provider} is not configured: {reason}")]
    ProviderNotConfigured { provider: String, reason: String },

    #[error("market data unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    #[error("{provider} rate limit reached. Please try again in a minute")]
    RateLimited { provider: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockfolioError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database {
            reason: err.to_string(),
        }
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::DatabaseQuery {
            reason: err.to_string(),
        }
    }

    /// Stable machine-readable tag, carried alongside the message in HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidSymbol { .. } => "invalid_symbol",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::ProviderNotConfigured { .. } => "provider_not_configured",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::RateLimited { .. } => "rate_limited",
            Self::Database { .. }
            | Self::DatabaseQuery { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. }
            | Self::Internal { .. }
            | Self::Io(_) => "server_error",
        }
    }

    /// Errors whose detail must stay in the logs rather than reach a caller.
    pub fn is_internal(&self) -> bool {
        self.code() == "server_error"
    }
}

impl From<&StockfolioError> for std::process::ExitCode {
    fn from(err: &StockfolioError) -> Self {
        let code: u8 = match err {
            StockfolioError::Io(_) | StockfolioError::Internal { .. } => 1,
            StockfolioError::ConfigParse { .. }
            | StockfolioError::ConfigMissing { .. }
            | StockfolioError::ConfigInvalid { .. } => 2,
            StockfolioError::Database { .. } | StockfolioError::DatabaseQuery { .. } => 3,
            StockfolioError::ProviderNotConfigured { .. }
            | StockfolioError::ProviderUnavailable { .. }
            | StockfolioError::RateLimited { .. } => 4,
            _ => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_message_names_both_amounts() {
        let err = StockfolioError::InsufficientFunds {
            required: Decimal::from(1000),
            available: Decimal::from(500),
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance. Required: 1000, Available: 500"
        );
    }

    #[test]
    fn storage_errors_are_internal() {
        assert!(StockfolioError::database("disk full").is_internal());
        assert!(StockfolioError::query("syntax").is_internal());
        assert!(!StockfolioError::not_found("Goal").is_internal());
    }

    #[test]
    fn codes_distinguish_provider_failures() {
        let missing = StockfolioError::ProviderNotConfigured {
            provider: "AlphaVantage".into(),
            reason: "no key".into(),
        };
        let limited = StockfolioError::RateLimited {
            provider: "AlphaVantage".into(),
        };
        assert_eq!(missing.code(), "provider_not_configured");
        assert_eq!(limited.code(), "rate_limited");
    }
}
