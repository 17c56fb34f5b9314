//! Persistence port for users, instruments, holdings and goals.

use rust_decimal::Decimal;

use crate::domain::error::StockfolioError;
use crate::domain::goal::Goal;
use crate::domain::holding::Holding;
use crate::domain::instrument::Instrument;
use crate::domain::user::{User, UserPatch};

pub trait StorePort: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    fn insert_user(&self, user: &User) -> Result<(), StockfolioError>;
    fn find_user(&self, id: &str) -> Result<Option<User>, StockfolioError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StockfolioError>;
    fn list_users(&self, include_inactive: bool) -> Result<Vec<User>, StockfolioError>;
    /// Writes only the fields set in `patch`; never the balance.
    fn patch_user(&self, user_id: &str, patch: &UserPatch) -> Result<(), StockfolioError>;
    fn update_balance(&self, user_id: &str, balance: Decimal) -> Result<(), StockfolioError>;
    fn count_users(&self) -> Result<u64, StockfolioError>;

    fn upsert_instrument(&self, instrument: &Instrument) -> Result<(), StockfolioError>;
    fn find_instrument(&self, symbol: &str) -> Result<Option<Instrument>, StockfolioError>;
    fn list_instruments(&self) -> Result<Vec<Instrument>, StockfolioError>;
    fn delete_instrument(&self, symbol: &str) -> Result<bool, StockfolioError>;
    fn count_instruments(&self) -> Result<u64, StockfolioError>;

    /// Inserts or replaces the holding together with its full transaction log.
    fn save_holding(&self, holding: &Holding) -> Result<(), StockfolioError>;
    fn find_holding(&self, id: &str) -> Result<Option<Holding>, StockfolioError>;
    fn find_holding_by_symbol(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<Holding>, StockfolioError>;
    fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>, StockfolioError>;
    fn delete_holding(&self, id: &str) -> Result<bool, StockfolioError>;
    fn count_holdings(&self) -> Result<u64, StockfolioError>;

    fn insert_goal(&self, goal: &Goal) -> Result<(), StockfolioError>;
    fn find_goal(&self, id: &str) -> Result<Option<Goal>, StockfolioError>;
    /// Newest first.
    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StockfolioError>;
    fn delete_goal(&self, id: &str) -> Result<bool, StockfolioError>;
}
