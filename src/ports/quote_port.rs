//! Market-data provider port.

use async_trait::async_trait;

use crate::domain::instrument::{CompanyInfo, Quote};
use crate::domain::quotes::QuoteError;

#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
    async fn fetch_company(&self, symbol: &str) -> Result<CompanyInfo, QuoteError>;
}
