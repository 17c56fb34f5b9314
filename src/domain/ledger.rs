//! Account ledger: the only writer of user balances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::info;
use rust_decimal::Decimal;

use super::error::StockfolioError;
use crate::ports::store_port::StorePort;

/// Smallest accepted top-up, withdrawal or purchase, in base currency units.
pub const MINIMUM_AMOUNT: Decimal = Decimal::ONE_HUNDRED;

/// One mutex per user id. Operations on different users never contend.
/// An entry lives only while some caller holds or waits on it.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `f` while holding `user_id`'s lock.
    pub fn run<T>(&self, user_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(user_id);
        let out = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        drop(lock);
        self.release(user_id);
        out
    }

    // Clones are only handed out under the map lock, so a count of one
    // means no other caller can be holding or about to take this mutex.
    fn release(&self, user_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }
    }
}

pub struct Ledger {
    store: Arc<dyn StorePort>,
    locks: Arc<UserLocks>,
}

impl Ledger {
    pub fn new(store: Arc<dyn StorePort>, locks: Arc<UserLocks>) -> Self {
        Ledger { store, locks }
    }

    pub fn balance(&self, user_id: &str) -> Result<Decimal, StockfolioError> {
        self.store
            .find_user(user_id)?
            .map(|u| u.balance())
            .ok_or_else(|| StockfolioError::not_found("User"))
    }

    pub fn top_up(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StockfolioError> {
        check_minimum(amount)?;
        let balance = self.locks.run(user_id, || self.credit(user_id, amount))?;
        info!("user {} topped up {}", user_id, amount);
        Ok(balance)
    }

    pub fn withdraw(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StockfolioError> {
        let balance = self.locks.run(user_id, || self.debit(user_id, amount))?;
        info!("user {} withdrew {}", user_id, amount);
        Ok(balance)
    }

    /// Removes `amount` from the balance. The caller must hold the user's lock.
    pub(crate) fn debit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StockfolioError> {
        check_minimum(amount)?;
        let available = self.balance(user_id)?;
        if amount > available {
            return Err(StockfolioError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let balance = available - amount;
        self.store.update_balance(user_id, balance)?;
        Ok(balance)
    }

    /// Adds `amount` to the balance. The caller must hold the user's lock.
    pub(crate) fn credit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StockfolioError> {
        if amount < Decimal::ZERO {
            return Err(StockfolioError::validation("credit amount must not be negative"));
        }
        let balance = self
            .balance(user_id)?
            .checked_add(amount)
            .ok_or_else(|| StockfolioError::validation("balance would exceed the maximum"))?;
        self.store.update_balance(user_id, balance)?;
        Ok(balance)
    }
}

fn check_minimum(amount: Decimal) -> Result<(), StockfolioError> {
    if amount < MINIMUM_AMOUNT {
        return Err(StockfolioError::InvalidAmount {
            minimum: MINIMUM_AMOUNT,
        });
    }
    Ok(())
}
