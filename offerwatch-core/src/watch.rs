use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::detector::ChangeDetector;
use crate::error::{FetchError, WatchError};
use crate::feed::{Entry, OfferSource};
use crate::filters::FilterSet;
use crate::notifier::Notifier;

pub const NO_OFFERS_MESSAGE: &str = "No housing offers found for the specified postal codes.";

#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
    /// Consecutive fetch failures before the loop logs at error level.
    pub failure_alert_threshold: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(5),
            failure_alert_threshold: 12,
        }
    }
}

pub fn offer_message(entry: &Entry) -> String {
    format!(
        "New offer: Address: {}, Rent: {} EUR, Available from: {}, published at: {}, status updated at: {}",
        entry.address, entry.rent, entry.availability_date, entry.published_at, entry.version
    )
}

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    FetchFailed,
    Empty { notified: bool },
    Offers { fetched: usize, notified: usize },
}

/// One poll cycle bound to a filter set: fetch, diff, notify.
pub struct WatchLoop {
    filters: FilterSet,
    source: Arc<dyn OfferSource>,
    notifier: Notifier,
    detector: ChangeDetector,
    consecutive_failures: u32,
    failure_alert_threshold: u32,
}

impl WatchLoop {
    pub fn new(
        filters: FilterSet,
        source: Arc<dyn OfferSource>,
        notifier: Notifier,
        detector: ChangeDetector,
        config: &WatchConfig,
    ) -> Self {
        Self {
            filters,
            source,
            notifier,
            detector,
            consecutive_failures: 0,
            failure_alert_threshold: config.failure_alert_threshold.max(1),
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn into_detector(self) -> ChangeDetector {
        self.detector
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let entries = match self.source.fetch(&self.filters).await {
            Ok(entries) => {
                self.consecutive_failures = 0;
                entries
            }
            Err(err) => {
                self.record_failure(&err);
                return CycleOutcome::FetchFailed;
            }
        };

        if entries.is_empty() {
            let notified = self.detector.should_report_empty();
            if notified {
                self.notifier.send_reliable(NO_OFFERS_MESSAGE).await;
            }
            return CycleOutcome::Empty { notified };
        }

        let fetched = entries.len();
        let changed = self.detector.observe(entries);
        for entry in &changed {
            info!(id = %entry.id, address = %entry.address, "new or updated offer");
            self.notifier.send_reliable(&offer_message(entry)).await;
        }
        CycleOutcome::Offers {
            fetched,
            notified: changed.len(),
        }
    }

    fn record_failure(&mut self, err: &FetchError) {
        self.consecutive_failures += 1;
        warn!(
            filters = %self.filters,
            failures = self.consecutive_failures,
            error = %err,
            "failed to fetch offers"
        );
        if self.consecutive_failures % self.failure_alert_threshold == 0 {
            error!(
                filters = %self.filters,
                failures = self.consecutive_failures,
                "feed keeps failing; no offers can be detected until it recovers"
            );
        }
    }
}

/// Handle on a running watch task.
pub struct WatchHandle {
    filters: FilterSet,
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<ChangeDetector>,
}

impl WatchHandle {
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signals cancellation and waits for the loop to exit. A cycle already
    /// in flight runs to completion first. Yields the detector state back.
    pub async fn stop(self) -> Result<ChangeDetector, WatchError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(WatchError::from)
    }
}

/// Starts polling immediately, then every `poll_interval`, until stopped.
pub fn spawn_watch(
    filters: FilterSet,
    source: Arc<dyn OfferSource>,
    notifier: Notifier,
    detector: ChangeDetector,
    config: WatchConfig,
) -> WatchHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let mut watch = WatchLoop::new(filters.clone(), source, notifier, detector, &config);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel_rx.recv() => {
                    info!(filters = %watch.filters(), "watch shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    watch.run_cycle().await;
                }
            }
        }
        watch.into_detector()
    });

    WatchHandle {
        filters,
        cancel_tx,
        join,
    }
}
