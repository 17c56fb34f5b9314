#![cfg(feature = "web")]
//! Instrument lookups, cache fallback and admin maintenance over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::*;

#[tokio::test]
async fn live_lookup_populates_cache() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;

    let (status, body) = app.get("/api/stocks/tcs", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "TCS");
    assert_eq!(body["companyName"], "Tata Consultancy Services");
    assert_eq!(num(&body["currentPrice"]), 3800.0);
    assert_eq!(body["cached"], false);

    let (_, listed) = app.get("/api/stocks", &token).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn provider_outage_serves_cached_record() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;
    app.get("/api/stocks/TCS", &token).await;

    app.quotes.set_failing(true);
    let (status, body) = app.get("/api/stocks/TCS", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(num(&body["currentPrice"]), 3800.0);

    let (status, _) = app.get("/api/stocks/INFY", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn price_patch_is_live_only() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;

    let (status, body) = app
        .request(Method::PATCH, "/api/stocks/TCS/price", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Stock not found");

    app.get("/api/stocks/TCS", &token).await;
    app.quotes.set_price("TCS", dec!(3900));
    let (status, body) = app
        .request(Method::PATCH, "/api/stocks/TCS/price", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(num(&body["currentPrice"]), 3900.0);

    app.quotes.set_failing(true);
    let (status, _) = app
        .request(Method::PATCH, "/api/stocks/TCS/price", Some(&token), None)
        .await;
    assert_ne!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_maintains_instrument_records() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (token, _) = app.register("ana@example.com").await;
    let record = json!({"symbol": "wipro", "companyName": "Wipro", "currentPrice": 450});

    let (status, _) = app.post("/api/stocks", &token, record.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post("/api/stocks", &admin, record.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["symbol"], "WIPRO");

    let (status, body) = app
        .post(
            "/api/stocks",
            &admin,
            json!({"symbol": "WIPRO", "companyName": "Wipro Ltd", "currentPrice": 460}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyName"], "Wipro Ltd");

    let (status, body) = app
        .post("/api/stocks", &admin, json!({"symbol": "NOPE"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_field");

    let (status, body) = app
        .request(Method::DELETE, "/api/stocks/WIPRO", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Stock deleted");

    let (status, _) = app
        .request(Method::DELETE, "/api/stocks/WIPRO", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
