//! Periodic price refresh and broadcast.
//!
//! One cycle walks every cached instrument in fixed-size batches. Quotes in a
//! batch are fetched concurrently; batches are separated by a delay to stay
//! under provider rate limits. The next cycle is armed only after the
//! previous one completes, so cycles never overlap.

use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use tokio::task::{JoinHandle, JoinSet};

use super::error::StockfolioError;
use super::instrument::PriceUpdate;
use super::instrument_cache::InstrumentCache;
use super::settings::RefreshSettings;
use crate::ports::push_port::PricePublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Running { batch: usize },
    Waiting { next_batch: usize },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub refreshed: usize,
    pub failed: usize,
    pub batches: usize,
}

pub struct PriceRefresher {
    cache: Arc<InstrumentCache>,
    publisher: Arc<dyn PricePublisher>,
    settings: RefreshSettings,
    state: Arc<Mutex<RefreshState>>,
}

impl PriceRefresher {
    pub fn new(
        cache: Arc<InstrumentCache>,
        publisher: Arc<dyn PricePublisher>,
        settings: RefreshSettings,
    ) -> Self {
        PriceRefresher {
            cache,
            publisher,
            settings,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
        }
    }

    fn set_state(&self, state: RefreshState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs a single refresh over every cached symbol.
    pub async fn run_cycle(&self) -> Result<CycleReport, StockfolioError> {
        let symbols: Vec<String> = self
            .cache
            .list()?
            .into_iter()
            .map(|instrument| instrument.symbol)
            .collect();
        let batch_size = self.settings.batch_size.max(1);
        let batches: Vec<&[String]> = symbols.chunks(batch_size).collect();
        let mut report = CycleReport {
            batches: batches.len(),
            ..CycleReport::default()
        };
        info!(
            "refreshing {} instruments in {} batches",
            symbols.len(),
            batches.len()
        );

        for (index, batch) in batches.iter().enumerate() {
            self.set_state(RefreshState::Running { batch: index });
            let mut fetches = JoinSet::new();
            for symbol in batch.iter().cloned() {
                let router = self.cache.router().clone();
                fetches.spawn(async move {
                    let result = router.quote(&symbol).await;
                    (symbol, result)
                });
            }
            while let Some(joined) = fetches.join_next().await {
                match joined {
                    Ok((symbol, Ok(quote))) => match self.cache.apply_quote(&quote) {
                        Ok(Some(instrument)) => {
                            let receivers = self.publisher.publish(PriceUpdate::from(&instrument));
                            debug!("{} -> {} ({} receivers)", symbol, instrument.current_price, receivers);
                            report.refreshed += 1;
                        }
                        Ok(None) => debug!("{} was removed during refresh", symbol),
                        Err(e) => {
                            error!("failed to store refreshed {}: {}", symbol, e);
                            report.failed += 1;
                        }
                    },
                    Ok((symbol, Err(e))) => {
                        warn!("refresh of {} failed: {}", symbol, e);
                        report.failed += 1;
                    }
                    Err(e) => {
                        error!("refresh task panicked: {}", e);
                        report.failed += 1;
                    }
                }
            }
            let is_last = index + 1 == batches.len();
            if !is_last && !self.settings.batch_delay.is_zero() {
                self.set_state(RefreshState::Waiting {
                    next_batch: index + 1,
                });
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        self.set_state(RefreshState::Idle);
        info!(
            "refresh cycle done: {} refreshed, {} failed",
            report.refreshed, report.failed
        );
        Ok(report)
    }

    /// Starts the timer loop: one cycle immediately, then one per interval
    /// measured from the end of the previous cycle.
    pub fn spawn(self: Arc<Self>) -> RefreshHandle {
        let state = self.state.clone();
        let interval = self.settings.interval;
        let task = tokio::spawn(async move {
            loop {
                if let Err(e) = self.run_cycle().await {
                    error!("refresh cycle aborted: {}", e);
                    self.set_state(RefreshState::Idle);
                }
                tokio::time::sleep(interval).await;
            }
        });
        RefreshHandle { task, state }
    }
}

/// Lifecycle control for a spawned refresher.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshHandle {
    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RefreshState::Stopped;
        info!("price refresh stopped");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
