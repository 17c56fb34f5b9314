//! Operator views and account management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::StockfolioError;
use super::holding::{Holding, Transaction};
use super::user::{PublicUser, User, UserPatch};
use crate::ports::store_port::StorePort;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_portfolios: u64,
    pub total_stocks: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSummary {
    pub id: String,
    pub symbol: String,
    pub quantity: i64,
    pub average_buy_price: Decimal,
    pub investment_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub transactions_count: usize,
    pub transactions: Vec<Transaction>,
}

impl From<Holding> for HoldingSummary {
    fn from(holding: Holding) -> Self {
        HoldingSummary {
            id: holding.id,
            symbol: holding.symbol,
            quantity: holding.quantity,
            average_buy_price: holding.average_buy_price,
            investment_date: holding.investment_date,
            last_updated: holding.last_updated,
            transactions_count: holding.transactions.len(),
            transactions: holding.transactions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub portfolios: Vec<HoldingSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    pub is_admin: Option<bool>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

pub struct AdminService {
    store: Arc<dyn StorePort>,
}

impl AdminService {
    pub fn new(store: Arc<dyn StorePort>) -> Self {
        AdminService { store }
    }

    pub fn stats(&self) -> Result<AdminStats, StockfolioError> {
        Ok(AdminStats {
            total_users: self.store.count_users()?,
            total_portfolios: self.store.count_holdings()?,
            total_stocks: self.store.count_instruments()?,
            last_updated: Utc::now(),
        })
    }

    fn view(&self, user: User) -> Result<AdminUserView, StockfolioError> {
        let portfolios = self
            .store
            .list_holdings(&user.id)?
            .into_iter()
            .map(HoldingSummary::from)
            .collect();
        Ok(AdminUserView {
            user: user.to_public(),
            portfolios,
        })
    }

    fn stored_user(&self, id: &str) -> Result<User, StockfolioError> {
        self.store
            .find_user(id)?
            .ok_or_else(|| StockfolioError::not_found("User"))
    }

    pub fn list_users(&self, show_disabled: bool) -> Result<Vec<AdminUserView>, StockfolioError> {
        self.store
            .list_users(show_disabled)?
            .into_iter()
            .map(|user| self.view(user))
            .collect()
    }

    pub fn get_user(&self, id: &str) -> Result<AdminUserView, StockfolioError> {
        let user = self.stored_user(id)?;
        self.view(user)
    }

    pub fn update_user(
        &self,
        id: &str,
        update: &AdminUserUpdate,
    ) -> Result<PublicUser, StockfolioError> {
        let patch = UserPatch {
            name: update
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            phone: update.phone.as_deref().map(|phone| {
                let phone = phone.trim();
                (!phone.is_empty()).then(|| phone.to_string())
            }),
            is_admin: update.is_admin,
            is_active: update.is_active,
            ..UserPatch::default()
        };
        self.store.patch_user(id, &patch)?;
        info!("admin updated user {}", id);
        Ok(self.stored_user(id)?.to_public())
    }

    /// Soft delete: the account is disabled and its holdings are kept.
    pub fn disable_user(&self, id: &str) -> Result<(), StockfolioError> {
        let patch = UserPatch {
            is_active: Some(false),
            ..UserPatch::default()
        };
        self.store.patch_user(id, &patch)?;
        info!("admin disabled user {}", id);
        Ok(())
    }

    pub fn delete_user_holding(&self, user_id: &str, holding_id: &str) -> Result<(), StockfolioError> {
        match self.store.find_holding(holding_id)? {
            Some(holding) if holding.user_id == user_id => {
                self.store.delete_holding(holding_id)?;
                info!("admin removed holding {} of user {}", holding_id, user_id);
                Ok(())
            }
            _ => Err(StockfolioError::not_found("Portfolio")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use rust_decimal_macros::dec;

    fn setup() -> (AdminService, Arc<SqliteAdapter>, User) {
        let store = Arc::new(SqliteAdapter::in_memory().unwrap());
        store.initialize_schema().unwrap();
        let user = User::new("member@example.com", "h".into(), "Member");
        store.insert_user(&user).unwrap();
        store
            .save_holding(&Holding::open(&user.id, "TCS", 3, dec!(100), Utc::now()))
            .unwrap();
        (AdminService::new(store.clone()), store, user)
    }

    #[test]
    fn stats_count_everything() {
        let (admin, _, _) = setup();
        let stats = admin.stats().unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_portfolios, 1);
        assert_eq!(stats.total_stocks, 0);
    }

    #[test]
    fn user_view_includes_holdings() {
        let (admin, _, user) = setup();
        let view = admin.get_user(&user.id).unwrap();
        assert_eq!(view.portfolios.len(), 1);
        assert_eq!(view.portfolios[0].transactions_count, 1);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["email"], "member@example.com");
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn disable_hides_user_but_keeps_holdings() {
        let (admin, store, user) = setup();
        admin.disable_user(&user.id).unwrap();
        assert!(admin.list_users(false).unwrap().is_empty());
        let all = admin.list_users(true).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].user.is_active);
        assert_eq!(store.list_holdings(&user.id).unwrap().len(), 1);
    }

    #[test]
    fn update_user_changes_flags() {
        let (admin, _, user) = setup();
        let update = AdminUserUpdate {
            is_admin: Some(true),
            name: Some("Promoted".into()),
            phone: None,
            is_active: None,
        };
        let updated = admin.update_user(&user.id, &update).unwrap();
        assert!(updated.is_admin);
        assert_eq!(updated.name, "Promoted");
        assert!(matches!(
            admin.update_user("missing", &update),
            Err(StockfolioError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_holding_checks_owner() {
        let (admin, store, user) = setup();
        let holding = store.list_holdings(&user.id).unwrap().remove(0);
        assert!(matches!(
            admin.delete_user_holding("someone-else", &holding.id),
            Err(StockfolioError::NotFound { .. })
        ));
        admin.delete_user_holding(&user.id, &holding.id).unwrap();
        assert_eq!(store.count_holdings().unwrap(), 0);
    }
}
