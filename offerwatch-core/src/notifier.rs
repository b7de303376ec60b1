use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::NotifyError;

/// A single fixed destination for outgoing text messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    backoff: Duration,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, backoff: Duration) -> Self {
        Self { sink, backoff }
    }

    /// One delivery attempt.
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.attempt(text, 1).await
    }

    /// Delivers `text`, retrying the identical message after a fixed backoff
    /// until the sink accepts it. Returns the number of attempts made.
    ///
    /// There is no retry cap: a sink that never recovers blocks the caller
    /// forever, which keeps delivery order intact for everything behind it.
    pub async fn send_reliable(&self, text: &str) -> u32 {
        let mut attempt = 1;
        loop {
            match self.attempt(text, attempt).await {
                Ok(()) => return attempt,
                Err(_) => {
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, text: &str, attempt: u32) -> Result<(), NotifyError> {
        match self.sink.send(text).await {
            Ok(()) => {
                info!(attempt, message = %text, "notification sent");
                Ok(())
            }
            Err(err) => {
                warn!(attempt, message = %text, error = %err, "error sending notification");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
