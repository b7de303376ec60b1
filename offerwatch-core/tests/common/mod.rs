#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use offerwatch_core::{
    Entry, FetchError, FilterSet, MessageSink, Notifier, NotifyError, OfferSource,
};

pub fn entry(id: &str, version: &str) -> Entry {
    Entry {
        id: id.into(),
        version: version.into(),
        address: format!("{id} rue de la Paix"),
        rent: "650".into(),
        availability_date: "2024-11-01".into(),
        published_at: "2024-10-20".into(),
    }
}

/// Feed fake: pops one scripted response per fetch, repeating the last one
/// once the script is exhausted.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Entry>, ()>>>,
    last: Mutex<Result<Vec<Entry>, ()>>,
    pub calls: Mutex<Vec<FilterSet>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Entry>, ()>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(Ok(Vec::new())),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OfferSource for ScriptedSource {
    async fn fetch(&self, filters: &FilterSet) -> Result<Vec<Entry>, FetchError> {
        self.calls.lock().unwrap().push(filters.clone());
        let next = self.script.lock().unwrap().pop_front();
        let result = match next {
            Some(result) => {
                *self.last.lock().unwrap() = result.clone();
                result
            }
            None => self.last.lock().unwrap().clone(),
        };
        result.map_err(|_| FetchError::Status(StatusCode::BAD_GATEWAY))
    }
}

/// Feed fake returning one offer per postal code, with the code as its id.
pub struct PerCodeSource;

#[async_trait]
impl OfferSource for PerCodeSource {
    async fn fetch(&self, filters: &FilterSet) -> Result<Vec<Entry>, FetchError> {
        Ok(filters
            .tokens()
            .iter()
            .map(|code| {
                let mut e = entry(&format!("offer-{code}"), "v1");
                e.address = format!("addr-{code}");
                e
            })
            .collect())
    }
}

/// Sink fake recording every delivered message; fails the first
/// `failures` attempts.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<String>>,
    pub attempts: AtomicU32,
    failures: AtomicU32,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(failures: u32) -> Arc<Self> {
        let sink = Self::default();
        sink.failures.store(failures, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn messages(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NotifyError::Rejected {
                status: StatusCode::TOO_MANY_REQUESTS,
                description: "Too Many Requests: retry later".into(),
            });
        }
        self.delivered.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

pub fn notifier(sink: &Arc<RecordingSink>) -> Notifier {
    Notifier::new(sink.clone(), Duration::from_secs(5))
}
