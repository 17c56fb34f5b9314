#![cfg(feature = "web")]
//! Goal tracking and operator endpoints.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn goal_lifecycle_with_computed_progress() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;
    app.fund(&token, 1000).await;
    app.post(
        "/api/portfolio",
        &token,
        json!({"symbol": "INFY", "quantity": 5, "price": 100}),
    )
    .await;

    let (status, goal) = app
        .post(
            "/api/goals",
            &token,
            json!({
                "title": "First lakh",
                "targetAmount": 1000,
                "targetDate": "2030-03-31",
                "type": "investment",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["title"], "First lakh");
    assert_eq!(goal["targetDate"], "2030-03-31");
    assert_eq!(goal["type"], "investment");
    let id = goal["id"].as_str().unwrap().to_string();

    let (status, goals) = app.get("/api/goals", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goals.as_array().unwrap().len(), 1);
    assert_eq!(num(&goals[0]["computedProgress"]), 50.0);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/goals/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Goal deleted");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/goals/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn goal_creation_validates_input() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;

    let (status, body) = app
        .post(
            "/api/goals",
            &token,
            json!({"title": "No date", "targetAmount": 500}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_field");

    let (status, body) = app
        .post(
            "/api/goals",
            &token,
            json!({"title": "Bad kind", "targetAmount": 500, "targetDate": "2030-01-01", "type": "lottery"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _) = app
        .post(
            "/api/goals",
            &token,
            json!({"title": "Zero", "targetAmount": 0, "targetDate": "2030-01-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn goals_are_private_to_their_owner() {
    let app = TestApp::new();
    let (owner, _) = app.register("owner@example.com").await;
    let (other, _) = app.register("other@example.com").await;
    let (_, goal) = app
        .post(
            "/api/goals",
            &owner,
            json!({"title": "House", "targetAmount": 5000, "targetDate": "2031-06-01"}),
        )
        .await;
    let id = goal["id"].as_str().unwrap().to_string();

    let (_, listed) = app.get("/api/goals", &other).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/goals/{id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_admin() {
    let app = TestApp::new();
    let (token, _) = app.register("ana@example.com").await;
    let (status, body) = app.get("/api/admin/stats", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, _) = app
        .request(Method::GET, "/api/admin/stats", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_stats_and_user_listing() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (token, id) = app.register("ana@example.com").await;
    app.fund(&token, 1000).await;
    app.post(
        "/api/portfolio",
        &token,
        json!({"symbol": "INFY", "quantity": 5, "price": 100}),
    )
    .await;

    let (status, stats) = app.get("/api/admin/stats", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalPortfolios"], 1);
    assert_eq!(stats["totalStocks"], 0);

    let (status, user) = app.get(&format!("/api/admin/users/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["portfolios"][0]["symbol"], "INFY");
    assert_eq!(user["portfolios"][0]["transactionsCount"], 1);

    let (status, _) = app.get("/api/admin/users/nope", &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn soft_delete_hides_user_unless_requested() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (token, id) = app.register("ana@example.com").await;
    app.fund(&token, 1000).await;
    app.post(
        "/api/portfolio",
        &token,
        json!({"symbol": "INFY", "quantity": 5, "price": 100}),
    )
    .await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User disabled (soft-deleted) successfully");

    let (_, active) = app.get("/api/admin/users", &admin).await;
    assert!(active.as_array().unwrap().iter().all(|u| u["id"] != id.as_str()));

    let (_, all) = app.get("/api/admin/users?showDisabled=true", &admin).await;
    let disabled = all
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == id.as_str())
        .unwrap();
    assert_eq!(disabled["isActive"], false);
    assert_eq!(disabled["portfolios"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_updates_user_and_removes_holding() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (token, id) = app.register("ana@example.com").await;
    app.fund(&token, 1000).await;
    let (_, bought) = app
        .post(
            "/api/portfolio",
            &token,
            json!({"symbol": "INFY", "quantity": 5, "price": 100}),
        )
        .await;
    let holding_id = bought["holding"]["id"].as_str().unwrap().to_string();

    let (status, user) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{id}"),
            Some(&admin),
            Some(json!({"name": "Ana Admin", "isAdmin": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Ana Admin");
    assert_eq!(user["isAdmin"], true);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/someone-else/portfolios/{holding_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{id}/portfolios/{holding_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Portfolio deleted");

    let (_, holdings) = app.get("/api/portfolio", &token).await;
    assert!(holdings.as_array().unwrap().is_empty());
    let (_, profile) = app.get("/api/auth/profile", &token).await;
    assert_eq!(num(&profile["balance"]), 500.0);
}
