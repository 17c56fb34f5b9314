//! Bearer token issuance and verification.

use crate::domain::error::StockfolioError;

pub trait TokenPort: Send + Sync {
    fn issue(&self, user_id: &str) -> Result<String, StockfolioError>;
    /// Returns the embedded user id.
    fn verify(&self, token: &str) -> Result<String, StockfolioError>;
}
