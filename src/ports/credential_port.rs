//! Password hashing port.

use crate::domain::error::StockfolioError;

pub trait CredentialPort: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, StockfolioError>;
    /// `Ok(false)` for a wrong password; `Err` only for a malformed stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, StockfolioError>;
}
