//! Financial goals and progress computation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StockfolioError;
use super::portfolio::Valuation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    #[default]
    Investment,
    Savings,
    Profit,
    PortfolioValue,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Investment => "investment",
            GoalKind::Savings => "savings",
            GoalKind::Profit => "profit",
            GoalKind::PortfolioValue => "portfolio_value",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StockfolioError> {
        match value.trim().to_lowercase().as_str() {
            "investment" => Ok(GoalKind::Investment),
            "savings" => Ok(GoalKind::Savings),
            "profit" => Ok(GoalKind::Profit),
            "portfolio_value" => Ok(GoalKind::PortfolioValue),
            other => Err(StockfolioError::validation(format!(
                "unknown goal type \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub target_amount: Decimal,
    pub target_date: NaiveDate,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: GoalKind,
    /// Stored as supplied; the displayed figure is recomputed on read.
    pub progress: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Raw goal input as it arrives from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: Option<String>,
    pub target_amount: Option<Decimal>,
    pub target_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub progress: Option<Decimal>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_target_date(value: &str) -> Result<NaiveDate, StockfolioError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| {
            StockfolioError::validation(format!(
                "invalid target date \"{}\", expected YYYY-MM-DD",
                value
            ))
        })
}

/// Percentage of `goal.target_amount` reached, in `[0, 100]`.
pub fn compute_progress(goal: &Goal, valuation: &Valuation) -> Decimal {
    if goal.target_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let reached = match goal.kind {
        GoalKind::Investment => valuation.total_cost,
        GoalKind::PortfolioValue => valuation.current_value,
        GoalKind::Profit => valuation.profit().max(Decimal::ZERO),
        GoalKind::Savings => return Decimal::ZERO,
    };
    // A ratio too large to represent is far past the target.
    reached
        .checked_div(goal.target_amount)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .round_dp(2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub computed_progress: Decimal,
}
