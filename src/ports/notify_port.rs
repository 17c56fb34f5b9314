//! Outbound account notifications.

use async_trait::async_trait;

use crate::domain::error::StockfolioError;
use crate::domain::notification::Notification;

#[async_trait]
pub trait NotifyPort: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), StockfolioError>;
}
