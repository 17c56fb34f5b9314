//! HTTP request handlers for the REST API.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::domain::access::ProfileUpdate;
use crate::domain::admin::AdminUserUpdate;
use crate::domain::error::StockfolioError;
use crate::domain::goal::NewGoal;
use crate::domain::instrument_cache::InstrumentInput;
use crate::domain::position_book::HoldingEdit;

use super::{AdminUser, AppState, CurrentUser, WebError};

type ApiResult = Result<Response, WebError>;

/// Success body carrying a human-readable message next to the payload.
#[derive(Serialize)]
struct WithMessage<T> {
    message: &'static str,
    #[serde(flatten)]
    body: T,
}

fn with_message<T: Serialize>(status: StatusCode, message: &'static str, body: T) -> Response {
    (status, Json(WithMessage { message, body })).into_response()
}

fn message(text: &'static str) -> Response {
    Json(json!({ "message": text })).into_response()
}

pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

pub async fn not_found() -> WebError {
    StockfolioError::not_found("Route").into()
}

// Auth

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AmountRequest {
    pub amount: Option<Decimal>,
}

impl AmountRequest {
    fn amount(&self) -> Result<Decimal, StockfolioError> {
        self.amount.ok_or_else(|| StockfolioError::missing("amount"))
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let session = state
        .access
        .register(&req.email, &req.password, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let session = state.access.login(&req.email, &req.password).await?;
    Ok(Json(session).into_response())
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    Ok(Json(state.access.profile(&user)?).into_response())
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    Ok(Json(state.access.update_profile(&user, &update)?).into_response())
}

pub async fn top_up(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let balance = state.ledger.top_up(&user.id, req.amount()?)?;
    Ok(with_message(
        StatusCode::OK,
        "Balance updated successfully",
        json!({ "balance": balance }),
    ))
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let balance = state.ledger.withdraw(&user.id, req.amount()?)?;
    Ok(with_message(
        StatusCode::OK,
        "Withdrawal processed successfully",
        json!({ "balance": balance }),
    ))
}

// Portfolio

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuyRequest {
    pub symbol: String,
    pub quantity: Option<i64>,
    #[serde(alias = "buyPrice")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Option<i64>,
}

pub async fn list_holdings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    Ok(Json(state.book.list_holdings(&user)?).into_response())
}

pub async fn portfolio_summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    Ok(Json(state.book.summary(&user)?).into_response())
}

pub async fn buy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<BuyRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    if req.symbol.trim().is_empty() {
        return Err(StockfolioError::missing("symbol").into());
    }
    let quantity = req
        .quantity
        .ok_or_else(|| StockfolioError::missing("quantity"))?;
    let price = req.price.ok_or_else(|| StockfolioError::missing("price"))?;
    let outcome = state.book.buy(&user, &req.symbol, quantity, price)?;
    Ok(with_message(
        StatusCode::CREATED,
        "Stock purchased successfully",
        outcome,
    ))
}

pub async fn update_holding(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<HoldingEdit>, JsonRejection>,
) -> ApiResult {
    let Json(edit) = payload?;
    Ok(Json(state.book.update_holding(&user, &id, &edit)?).into_response())
}

pub async fn sell_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let outcome = state.book.sell_all(&user, &id)?;
    Ok(with_message(StatusCode::OK, "Stock sold successfully", outcome))
}

pub async fn sell_partial(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<QuantityRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let quantity = req
        .quantity
        .ok_or_else(|| StockfolioError::missing("quantity"))?;
    let outcome = state.book.sell_partial(&user, &id, quantity)?;
    Ok(with_message(StatusCode::OK, "Stock sold successfully", outcome))
}

// Stocks

pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult {
    Ok(Json(state.instruments.list()?).into_response())
}

pub async fn lookup_stock(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(symbol): Path<String>,
) -> ApiResult {
    Ok(Json(state.instruments.lookup(&symbol).await?).into_response())
}

pub async fn refresh_stock_price(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(symbol): Path<String>,
) -> ApiResult {
    Ok(Json(state.instruments.refresh_price(&symbol).await?).into_response())
}

pub async fn upsert_stock(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    payload: Result<Json<InstrumentInput>, JsonRejection>,
) -> ApiResult {
    let Json(input) = payload?;
    let (instrument, created) = state.instruments.upsert(input)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(instrument)).into_response())
}

pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(symbol): Path<String>,
) -> ApiResult {
    state.instruments.delete(&symbol)?;
    Ok(message("Stock deleted"))
}

// Goals

pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult {
    Ok(Json(state.goals.list(&user)?).into_response())
}

pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> ApiResult {
    let Json(input) = payload?;
    let goal = state.goals.create(&user, input)?;
    Ok((StatusCode::CREATED, Json(goal)).into_response())
}

pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    state.goals.delete(&user, &id)?;
    Ok(message("Goal deleted"))
}

// Admin

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[serde(default)]
    pub show_disabled: bool,
}

pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> ApiResult {
    Ok(Json(state.admin.stats()?).into_response())
}

pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    Ok(Json(state.admin.list_users(query.show_disabled)?).into_response())
}

pub async fn admin_get_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult {
    Ok(Json(state.admin.get_user(&id)?).into_response())
}

pub async fn admin_update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<AdminUserUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    Ok(Json(state.admin.update_user(&id, &update)?).into_response())
}

pub async fn admin_disable_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult {
    state.admin.disable_user(&id)?;
    Ok(message("User disabled (soft-deleted) successfully"))
}

pub async fn admin_delete_holding(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path((user_id, holding_id)): Path<(String, String)>,
) -> ApiResult {
    state.admin.delete_user_holding(&user_id, &holding_id)?;
    Ok(message("Portfolio deleted"))
}
