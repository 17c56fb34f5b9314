//! Fan-out of refreshed prices to connected clients.

use crate::domain::instrument::PriceUpdate;

pub trait PricePublisher: Send + Sync {
    /// Returns how many subscribers the update was handed to.
    fn publish(&self, update: PriceUpdate) -> usize;
}
