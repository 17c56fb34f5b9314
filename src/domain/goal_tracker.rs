//! Goal CRUD with progress computed from the live portfolio.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use super::error::StockfolioError;
use super::goal::{compute_progress, parse_target_date, Goal, GoalKind, GoalView, NewGoal};
use super::position_book::PositionBook;
use super::user::User;
use crate::ports::store_port::StorePort;

pub struct GoalTracker {
    store: Arc<dyn StorePort>,
    book: Arc<PositionBook>,
}

impl GoalTracker {
    pub fn new(store: Arc<dyn StorePort>, book: Arc<PositionBook>) -> Self {
        GoalTracker { store, book }
    }

    pub fn create(&self, user: &User, input: NewGoal) -> Result<Goal, StockfolioError> {
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StockfolioError::missing("title"))?;
        let target_amount = input
            .target_amount
            .ok_or_else(|| StockfolioError::missing("targetAmount"))?;
        let target_date = input
            .target_date
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| StockfolioError::missing("targetDate"))?;
        if target_amount <= Decimal::ZERO {
            return Err(StockfolioError::validation("target amount must be positive"));
        }
        let kind = match input.kind.as_deref().map(str::trim) {
            None | Some("") => GoalKind::default(),
            Some(kind) => GoalKind::parse(kind)?,
        };
        let goal = Goal {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            title,
            target_amount,
            target_date: parse_target_date(&target_date)?,
            description: input.description.filter(|d| !d.trim().is_empty()),
            kind,
            progress: input.progress.unwrap_or(Decimal::ZERO),
            created_at: Utc::now(),
        };
        self.store.insert_goal(&goal)?;
        Ok(goal)
    }

    pub fn list(&self, user: &User) -> Result<Vec<GoalView>, StockfolioError> {
        let goals = self.store.list_goals(&user.id)?;
        if goals.is_empty() {
            return Ok(Vec::new());
        }
        let valuation = self.book.summary(user)?.valuation();
        Ok(goals
            .into_iter()
            .map(|goal| {
                let computed_progress = compute_progress(&goal, &valuation);
                GoalView {
                    goal,
                    computed_progress,
                }
            })
            .collect())
    }

    pub fn delete(&self, user: &User, goal_id: &str) -> Result<(), StockfolioError> {
        match self.store.find_goal(goal_id)? {
            Some(goal) if goal.user_id == user.id => {
                self.store.delete_goal(goal_id)?;
                Ok(())
            }
            _ => Err(StockfolioError::not_found("Goal")),
        }
    }
}
