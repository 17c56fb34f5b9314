//! Broadcast registry for price pushes.
//!
//! The hub is explicitly started and stopped. While stopped, publishes are
//! dropped and no new subscriber can join. Stopping drops the sender, which
//! closes every live subscription.

use std::sync::RwLock;

use log::{debug, info};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::instrument::PriceUpdate;
use crate::ports::push_port::PricePublisher;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushEnvelope {
    ConnectionEstablished { message: String },
    StockUpdate(PriceUpdate),
}

impl PushEnvelope {
    pub fn welcome() -> Self {
        PushEnvelope::ConnectionEstablished {
            message: "Connected to stock updates".to_string(),
        }
    }
}

pub struct PushHub {
    capacity: usize,
    sender: RwLock<Option<broadcast::Sender<PushEnvelope>>>,
}

impl PushHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sender: RwLock::new(None),
        }
    }

    pub fn start(&self) {
        let mut sender = self.sender.write().unwrap_or_else(|e| e.into_inner());
        if sender.is_none() {
            let (tx, _) = broadcast::channel(self.capacity);
            *sender = Some(tx);
            info!("push hub started");
        }
    }

    pub fn stop(&self) {
        let mut sender = self.sender.write().unwrap_or_else(|e| e.into_inner());
        if sender.take().is_some() {
            info!("push hub stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// `None` while the hub is stopped.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<PushEnvelope>> {
        self.sender
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map_or(0, |tx| tx.receiver_count())
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PricePublisher for PushHub {
    fn publish(&self, update: PriceUpdate) -> usize {
        let sender = self.sender.read().unwrap_or_else(|e| e.into_inner());
        match sender.as_ref() {
            // Err only means nobody is listening.
            Some(tx) => tx.send(PushEnvelope::StockUpdate(update)).unwrap_or(0),
            None => {
                debug!("push hub stopped, dropping update for {}", update.symbol);
                0
            }
        }
    }
}
