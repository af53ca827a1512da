//! # Scheduler Tests
//!
//! Broadcast pass isolation, skip rules and shutdown.


use chrono::{Duration, NaiveTime};
use daily_words_bot::clock::moscow_offset;
use daily_words_bot::level::CefrLevel;
use daily_words_bot::localization::create_localization_manager;
use daily_words_bot::scheduler::{BroadcastReport, DailyTrigger, Scheduler};
use daily_words_bot::store::UserStore;
use daily_words_bot::word_source::WordProvider;
use std::sync::Arc;
use test_helpers::{setup_engine, RecordingDelivery, SequentialProvider, TestEngine};
use tokio_util::sync::CancellationToken;

fn ten_am() -> DailyTrigger {
    DailyTrigger::new(NaiveTime::from_hms_opt(10, 0, 0).unwrap(), moscow_offset())
}

fn scheduler_for(t: &TestEngine, delivery: Arc<RecordingDelivery>) -> Scheduler {
    Scheduler::new(
        Arc::clone(&t.engine),
        delivery,
        create_localization_manager().expect("Failed to create localization manager"),
        t.clock.clone(),
        ten_am(),
    )
}

fn engine_with_words() -> TestEngine {
    setup_engine(
        vec![Arc::new(SequentialProvider::new(60)) as Arc<dyn WordProvider>],
        5,
    )
}

#[tokio::test]
async fn test_failed_delivery_does_not_stop_other_users() {
    let t = engine_with_words();
    for user_id in [1, 2, 3] {
        t.engine.select_level(user_id, CefrLevel::A1).await.unwrap();
    }

    let delivery = Arc::new(RecordingDelivery::failing_for(&[2]));
    let scheduler = scheduler_for(&t, delivery.clone());

    let report = scheduler.run_daily_pass().await;

    assert_eq!(
        report,
        BroadcastReport {
            delivered: 2,
            failed: 1,
            skipped: 0,
        }
    );
    assert_eq!(delivery.recipients(), vec![1, 3]);
}

#[tokio::test]
async fn test_users_without_level_are_skipped() {
    let t = engine_with_words();
    t.engine.select_level(10, CefrLevel::B2).await.unwrap();
    // Touching the store registers the user without a level
    t.store.get(11).await.unwrap();

    let delivery = Arc::new(RecordingDelivery::default());
    let report = scheduler_for(&t, delivery.clone()).run_daily_pass().await;

    assert_eq!(report.delivered, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(delivery.recipients(), vec![10]);
}

#[tokio::test]
async fn test_daily_message_lists_the_batch() {
    let t = engine_with_words();
    let batch = t.engine.select_level(5, CefrLevel::A2).await.unwrap();

    let delivery = Arc::new(RecordingDelivery::default());
    scheduler_for(&t, delivery.clone()).run_daily_pass().await;

    let sent = delivery.sent();
    assert_eq!(sent.len(), 1);
    let (_, text) = &sent[0];
    assert!(text.starts_with("🌅 Доброе утро!"));
    assert!(text.contains("(A2)"));
    for entry in &batch {
        assert!(text.contains(&entry.word));
    }
}

#[tokio::test]
async fn test_pass_reuses_batch_picked_earlier_the_same_day() {
    let t = engine_with_words();
    let picked = t.engine.select_level(7, CefrLevel::C1).await.unwrap();

    let delivery = Arc::new(RecordingDelivery::default());
    let scheduler = scheduler_for(&t, delivery);
    scheduler.run_daily_pass().await;

    assert_eq!(t.engine.current(7).await.unwrap(), picked);

    // Next morning the batch is replaced
    t.clock.advance(Duration::days(1));
    scheduler.run_daily_pass().await;
    assert_ne!(t.engine.current(7).await.unwrap(), picked);
}

#[tokio::test]
async fn test_claim_guards_against_double_fire() {
    let t = engine_with_words();
    let scheduler = scheduler_for(&t, Arc::new(RecordingDelivery::default()));
    let today = t.engine.today();

    assert!(scheduler.claim(today));
    assert!(!scheduler.claim(today));
    assert!(scheduler.claim(today.succ_opt().unwrap()));
}

#[tokio::test]
async fn test_run_stops_on_cancellation() {
    let t = engine_with_words();
    let scheduler = Arc::new(scheduler_for(&t, Arc::new(RecordingDelivery::default())));
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    shutdown.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
