#![allow(dead_code)]

use argon2::Params;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stockfolio::adapters::argon2_credentials::Argon2Credentials;
use stockfolio::adapters::sqlite_adapter::SqliteAdapter;
use stockfolio::domain::error::StockfolioError;
use stockfolio::domain::instrument::{CompanyInfo, Quote};
use stockfolio::domain::notification::Notification;
use stockfolio::domain::quotes::{QuoteError, QuoteRouter};
use stockfolio::ports::notify_port::NotifyPort;
use stockfolio::ports::quote_port::QuoteSource;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789";

/// Reads a JSON amount that may be encoded as a string or a number.
pub fn num(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::String(s) => s.parse().unwrap(),
        other => other.as_f64().unwrap(),
    }
}

pub fn memory_store() -> Arc<SqliteAdapter> {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Arc::new(store)
}

/// Argon2id with the smallest legal cost so tests stay fast.
pub fn cheap_credentials() -> Arc<Argon2Credentials> {
    Arc::new(Argon2Credentials::with_params(
        Params::new(8, 1, 1, None).unwrap(),
    ))
}

/// In-memory market data source with switchable outages.
pub struct StaticQuotes {
    name: &'static str,
    prices: Mutex<HashMap<String, Decimal>>,
    companies: HashMap<String, String>,
    failing: AtomicBool,
    pub quote_calls: AtomicUsize,
}

impl StaticQuotes {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            prices: Mutex::new(HashMap::new()),
            companies: HashMap::new(),
            failing: AtomicBool::new(false),
            quote_calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, symbol: &str, company: &str, price: Decimal) -> Self {
        self.prices
            .get_mut()
            .unwrap()
            .insert(symbol.to_string(), price);
        self.companies.insert(symbol.to_string(), company.to_string());
        self
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn outage(&self) -> Option<QuoteError> {
        self.failing.load(Ordering::SeqCst).then(|| QuoteError::Upstream {
            provider: self.name.into(),
            reason: "connection refused".into(),
        })
    }
}

#[async_trait]
impl QuoteSource for StaticQuotes {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.outage() {
            return Err(err);
        }
        let price = self.prices.lock().unwrap().get(symbol).copied();
        let price = price.ok_or_else(|| QuoteError::NoData {
            provider: self.name.into(),
            symbol: symbol.to_string(),
        })?;
        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            day_high: Some(price + Decimal::ONE),
            day_low: Some(price - Decimal::ONE),
            volume: Some(1_000),
            timestamp: Utc::now(),
        })
    }

    async fn fetch_company(&self, symbol: &str) -> Result<CompanyInfo, QuoteError> {
        if let Some(err) = self.outage() {
            return Err(err);
        }
        let company_name = self.companies.get(symbol).cloned().ok_or_else(|| {
            QuoteError::NoData {
                provider: self.name.into(),
                symbol: symbol.to_string(),
            }
        })?;
        Ok(CompanyInfo {
            symbol: symbol.to_string(),
            company_name,
            sector: Some("Technology".into()),
            industry: None,
            description: None,
        })
    }
}

pub fn sample_quotes() -> Arc<StaticQuotes> {
    Arc::new(
        StaticQuotes::new("primary")
            .with("TCS", "Tata Consultancy Services", Decimal::from(3800))
            .with("INFY", "Infosys", Decimal::from(100))
            .with("RELIANCE", "Reliance Industries", Decimal::from(2500)),
    )
}

/// Router whose secondary provider knows nothing.
pub fn router_over(primary: Arc<StaticQuotes>) -> QuoteRouter {
    QuoteRouter::new(primary, Arc::new(StaticQuotes::new("secondary")))
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyPort for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), StockfolioError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StockfolioError::Internal {
                reason: "mail relay down".into(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "web")]
mod web {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use stockfolio::adapters::jwt_tokens::JwtTokens;
    use stockfolio::adapters::push_hub::PushHub;
    use stockfolio::adapters::web::{AppState, build_router};
    use tower::ServiceExt;

    pub struct TestApp {
        pub state: Arc<AppState>,
        pub store: Arc<SqliteAdapter>,
        pub quotes: Arc<StaticQuotes>,
        pub notifier: Arc<RecordingNotifier>,
        pub hub: Arc<PushHub>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let store = memory_store();
            let quotes = sample_quotes();
            let notifier = Arc::new(RecordingNotifier::default());
            let hub = Arc::new(PushHub::default());
            hub.start();
            let state = Arc::new(AppState::new(
                store.clone(),
                cheap_credentials(),
                Arc::new(JwtTokens::new(JWT_SECRET, 24)),
                notifier.clone(),
                router_over(quotes.clone()),
                hub.clone(),
            ));
            Self {
                state,
                store,
                quotes,
                notifier,
                hub,
            }
        }

        pub fn router(&self) -> Router {
            build_router(self.state.clone())
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
            self.request(Method::GET, uri, Some(token), None).await
        }

        pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
            self.request(Method::POST, uri, Some(token), Some(body)).await
        }

        /// Registers a user and returns `(token, user id)`.
        pub async fn register(&self, email: &str) -> (String, String) {
            let (status, body) = self
                .request(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(serde_json::json!({
                        "email": email,
                        "password": "hunter2hunter2",
                        "name": "Test User",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
            (
                body["token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }

        pub async fn admin(&self) -> String {
            self.state
                .access
                .create_user("root@example.com", "rootpassword", "Root", true)
                .unwrap();
            let session = self
                .state
                .access
                .login("root@example.com", "rootpassword")
                .await
                .unwrap();
            session.token
        }

        pub async fn fund(&self, token: &str, amount: u64) {
            let (status, body) = self
                .post("/api/auth/topup", token, serde_json::json!({ "amount": amount }))
                .await;
            assert_eq!(status, StatusCode::OK, "top-up failed: {body}");
        }
    }
}
