mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{entry, notifier, RecordingSink, ScriptedSource};
use offerwatch_core::{
    offer_message, spawn_watch, ChangeDetector, CycleOutcome, FilterSet, WatchConfig, WatchLoop,
    NO_OFFERS_MESSAGE,
};

fn filters() -> FilterSet {
    FilterSet::parse("75011").unwrap()
}

fn watch_loop(source: Arc<ScriptedSource>, sink: &Arc<RecordingSink>) -> WatchLoop {
    WatchLoop::new(
        filters(),
        source,
        notifier(sink),
        ChangeDetector::new(),
        &WatchConfig::default(),
    )
}

#[tokio::test]
async fn unchanged_offer_is_notified_once_and_version_bump_again() {
    let source = ScriptedSource::new(vec![
        Ok(vec![entry("A", "v1")]),
        Ok(vec![entry("A", "v1")]),
        Ok(vec![entry("A", "v2")]),
    ]);
    let sink = RecordingSink::new();
    let mut watch = watch_loop(source, &sink);

    assert_eq!(
        watch.run_cycle().await,
        CycleOutcome::Offers { fetched: 1, notified: 1 }
    );
    assert_eq!(
        watch.run_cycle().await,
        CycleOutcome::Offers { fetched: 1, notified: 0 }
    );
    assert_eq!(
        watch.run_cycle().await,
        CycleOutcome::Offers { fetched: 1, notified: 1 }
    );

    assert_eq!(
        sink.messages(),
        vec![offer_message(&entry("A", "v1")), offer_message(&entry("A", "v2"))]
    );
}

#[tokio::test]
async fn empty_results_are_reported_once_per_silence() {
    let source = ScriptedSource::new(vec![
        Ok(vec![]),
        Ok(vec![]),
        Ok(vec![entry("A", "v1")]),
        Ok(vec![]),
    ]);
    let sink = RecordingSink::new();
    let mut watch = watch_loop(source, &sink);

    assert_eq!(watch.run_cycle().await, CycleOutcome::Empty { notified: true });
    assert_eq!(watch.run_cycle().await, CycleOutcome::Empty { notified: false });
    watch.run_cycle().await;
    assert_eq!(watch.run_cycle().await, CycleOutcome::Empty { notified: true });

    let no_offers = sink
        .messages()
        .iter()
        .filter(|m| m.as_str() == NO_OFFERS_MESSAGE)
        .count();
    assert_eq!(no_offers, 2);
    assert_eq!(sink.messages().len(), 3);
}

#[tokio::test]
async fn fetch_errors_are_silent_and_keep_state() {
    let source = ScriptedSource::new(vec![
        Ok(vec![entry("A", "v1")]),
        Err(()),
        Ok(vec![entry("A", "v1")]),
    ]);
    let sink = RecordingSink::new();
    let mut watch = watch_loop(source, &sink);

    watch.run_cycle().await;
    assert_eq!(watch.run_cycle().await, CycleOutcome::FetchFailed);
    assert_eq!(
        watch.run_cycle().await,
        CycleOutcome::Offers { fetched: 1, notified: 0 }
    );
    assert_eq!(sink.messages().len(), 1);
    assert!(watch.detector().seen().contains_key("A"));
}

#[tokio::test]
async fn offers_are_notified_in_feed_order() {
    let source = ScriptedSource::new(vec![Ok(vec![
        entry("C", "v1"),
        entry("A", "v1"),
        entry("B", "v1"),
    ])]);
    let sink = RecordingSink::new();
    let mut watch = watch_loop(source, &sink);

    watch.run_cycle().await;
    let expected: Vec<String> = ["C", "A", "B"]
        .iter()
        .map(|id| offer_message(&entry(id, "v1")))
        .collect();
    assert_eq!(sink.messages(), expected);
}

#[tokio::test(start_paused = true)]
async fn spawned_watch_polls_immediately_then_on_interval() {
    let source = ScriptedSource::new(vec![Ok(vec![entry("A", "v1")])]);
    let sink = RecordingSink::new();
    let handle = spawn_watch(
        filters(),
        source.clone(),
        notifier(&sink),
        ChangeDetector::new(),
        WatchConfig::default(),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.call_count(), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.call_count(), 3);
    assert_eq!(sink.messages().len(), 1);

    let detector = handle.stop().await.unwrap();
    assert_eq!(detector.seen().get("A").map(String::as_str), Some("v1"));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.call_count(), 3, "no polling after stop");
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_cycle_in_flight() {
    // The first offer message needs two retries; stop is requested while
    // the loop is still delivering it.
    let source = ScriptedSource::new(vec![Ok(vec![entry("A", "v1"), entry("B", "v1")])]);
    let sink = RecordingSink::failing(2);
    let handle = spawn_watch(
        filters(),
        source.clone(),
        notifier(&sink),
        ChangeDetector::new(),
        WatchConfig::default(),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(sink.messages().is_empty());

    let detector = handle.stop().await.unwrap();
    assert_eq!(sink.messages().len(), 2, "cycle finished before exit");
    assert_eq!(detector.seen().len(), 2);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn duplicate_offer_in_one_response_is_notified_once() {
    let source = ScriptedSource::new(vec![Ok(vec![entry("A", "v1"), entry("A", "v1")])]);
    let sink = RecordingSink::new();
    let mut watch = watch_loop(source, &sink);

    assert_eq!(
        watch.run_cycle().await,
        CycleOutcome::Offers { fetched: 2, notified: 1 }
    );
    assert_eq!(sink.messages(), vec![offer_message(&entry("A", "v1"))]);
}
