use std::sync::Arc;

use tracing::{info, warn};

use crate::detector::ChangeDetector;
use crate::error::WatchError;
use crate::feed::OfferSource;
use crate::filters::FilterSet;
use crate::notifier::Notifier;
use crate::store::FilterStore;
use crate::watch::{spawn_watch, WatchConfig, WatchHandle};

/// Result of a filter change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// A fresh watch was started for these filters.
    Applied(FilterSet),
    /// The filters were already active; nothing was restarted.
    Unchanged(FilterSet),
}

pub fn filters_set_message(filters: &FilterSet) -> String {
    format!("Postal codes set to {filters}. Searching for offers...")
}

/// Owns the active filter set and the single running watch.
///
/// Detection state moves into each watch task and comes back through
/// [`WatchHandle::stop`], so only one loop can ever touch it.
pub struct WatchManager {
    source: Arc<dyn OfferSource>,
    notifier: Notifier,
    store: FilterStore,
    config: WatchConfig,
    active: Option<FilterSet>,
    current: Option<WatchHandle>,
    detector: ChangeDetector,
}

impl WatchManager {
    pub fn new(
        source: Arc<dyn OfferSource>,
        notifier: Notifier,
        store: FilterStore,
        config: WatchConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            config,
            active: None,
            current: None,
            detector: ChangeDetector::new(),
        }
    }

    pub fn active_filters(&self) -> Option<&FilterSet> {
        self.active.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn set_filters<I, S>(&mut self, tokens: I) -> Result<SetOutcome, WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filters = FilterSet::new(tokens)?;
        if self.active.as_ref() == Some(&filters) && self.is_running() {
            info!(filters = %filters, "postal codes already active");
            return Ok(SetOutcome::Unchanged(filters));
        }

        self.stop_current().await;
        self.detector.reset();

        if let Err(e) = self.store.save(&filters).await {
            warn!(error = %e, path = %self.store.path().display(), "failed to persist postal codes");
        }

        self.notifier
            .send_reliable(&filters_set_message(&filters))
            .await;

        let detector = std::mem::take(&mut self.detector);
        let handle = spawn_watch(
            filters.clone(),
            self.source.clone(),
            self.notifier.clone(),
            detector,
            self.config,
        );
        info!(filters = %filters, "watch started");
        self.current = Some(handle);
        self.active = Some(filters.clone());
        Ok(SetOutcome::Applied(filters))
    }

    /// Re-applies the persisted filter set, if any.
    pub async fn resume(&mut self) -> Result<Option<SetOutcome>, WatchError> {
        match self.store.load().await? {
            Some(saved) => {
                info!(filters = %saved, "resuming saved postal codes");
                let outcome = self.set_filters(saved.tokens().to_vec()).await?;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    /// Stops the running watch, if any, and forgets the active filters.
    pub async fn shutdown(&mut self) {
        self.stop_current().await;
        self.active = None;
    }

    async fn stop_current(&mut self) {
        let Some(handle) = self.current.take() else {
            return;
        };
        let filters = handle.filters().clone();
        match handle.stop().await {
            Ok(detector) => self.detector = detector,
            Err(e) => {
                warn!(filters = %filters, error = %e, "watch task ended abnormally");
                self.detector = ChangeDetector::new();
            }
        }
        info!(filters = %filters, "watch stopped");
    }
}
