//! HTTP error responses for the REST API.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde::Serialize;

use crate::domain::error::StockfolioError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: &'a str,
}

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "validation_error")
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "provider_unavailable")
    }
}

pub fn status_from_error(err: &StockfolioError) -> StatusCode {
    match err {
        StockfolioError::Validation { .. }
        | StockfolioError::MissingField { .. }
        | StockfolioError::InvalidAmount { .. }
        | StockfolioError::InsufficientFunds { .. }
        | StockfolioError::InvalidSymbol { .. }
        | StockfolioError::BelowMinimum { .. }
        | StockfolioError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
        StockfolioError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        StockfolioError::Forbidden { .. } => StatusCode::FORBIDDEN,
        StockfolioError::NotFound { .. } => StatusCode::NOT_FOUND,
        StockfolioError::Conflict { .. } => StatusCode::CONFLICT,
        StockfolioError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        StockfolioError::ProviderNotConfigured { .. }
        | StockfolioError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        StockfolioError::Database { .. }
        | StockfolioError::DatabaseQuery { .. }
        | StockfolioError::ConfigParse { .. }
        | StockfolioError::ConfigMissing { .. }
        | StockfolioError::ConfigInvalid { .. }
        | StockfolioError::Internal { .. }
        | StockfolioError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StockfolioError> for WebError {
    fn from(err: StockfolioError) -> Self {
        let status = status_from_error(&err);
        if err.is_internal() {
            error!("request failed: {}", err);
            return Self::new(status, "Server error", err.code());
        }
        Self::new(status, err.to_string(), err.code())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
