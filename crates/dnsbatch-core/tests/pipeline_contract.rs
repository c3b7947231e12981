//! Contract Test: End-to-End Pipeline
//!
//! Constraints verified:
//! - The batch reaches the provider unchanged, under the resolved zone
//! - Submission happens exactly once, even when the provider rejects it
//! - Provider rejections surface verbatim as submission failures
//! - A run whose sync polling times out still reports success

mod common;

use common::*;
use dnsbatch_core::{
    BatchConfig, ChangeBatch, ChangeStatus, EngineEvent, Error, SyncEngine, SyncOutcome, UrlBase,
};

fn example_batch() -> (ChangeBatch, UrlBase) {
    let table = device_table(
        "Company,Gateway,url,ipaddress\n\
         Acme,Front Desk,acme-fd,10.0.0.1\n\
         Acme,Warehouse,acme-wh,\n\
         Globex,Lab,gx-lab,10.0.1.7\n",
    );
    let base = UrlBase::parse("example.com").unwrap();
    let batch = ChangeBatch::from_csv(table.path(), &base, &BatchConfig::default()).unwrap();
    (batch, base)
}

#[tokio::test(start_paused = true)]
async fn full_run_submits_once_and_syncs() {
    let (batch, base) = example_batch();
    let provider = ScriptedProvider::example_com().in_sync_on_poll(2);
    let calls = provider.calls();
    let (engine, events) = SyncEngine::new(Box::new(provider), default_sync()).unwrap();

    let report = engine.run(&batch, &base).await.unwrap();

    assert_eq!(report.zone_id, "ABC");
    assert_eq!(report.change.id, CHANGE_ID);
    assert_eq!(report.change.status, ChangeStatus::Pending);
    assert_eq!(report.outcome, SyncOutcome::InSync { polls: 2 });

    let submitted = calls.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].0, "ABC");
    assert_eq!(submitted[0].1, batch);
    assert_eq!(submitted[0].1.len(), 2);

    drop(engine);
    let events = drain_events(events).await;
    assert_eq!(
        events.first(),
        Some(&EngineEvent::ZoneResolved {
            zone_name: "example.com.".to_string(),
            zone_id: "ABC".to_string(),
        })
    );
    assert!(events.contains(&EngineEvent::Submitted {
        change_id: CHANGE_ID.to_string(),
        status: ChangeStatus::Pending,
        changes: 2,
    }));
}

#[tokio::test(start_paused = true)]
async fn timed_out_run_is_still_successful() {
    let (batch, base) = example_batch();
    let (engine, _events) =
        SyncEngine::new(Box::new(ScriptedProvider::example_com()), default_sync()).unwrap();

    let report = engine.run(&batch, &base).await.unwrap();

    assert!(matches!(report.outcome, SyncOutcome::TimedOut { .. }));
}

#[tokio::test]
async fn rejection_is_surfaced_verbatim_without_retry() {
    let (batch, base) = example_batch();
    let message = "InvalidChangeBatch: [Invalid Resource Record: FATAL problem: ARRDATAIllegalIPv4Address]";
    let provider = ScriptedProvider::example_com().rejecting(message);
    let calls = provider.calls();
    let (engine, _events) = SyncEngine::new(Box::new(provider), default_sync()).unwrap();

    let err = engine.run(&batch, &base).await.unwrap_err();

    assert!(matches!(err, Error::SubmissionFailed(ref msg) if msg == message));
    assert_eq!(calls.submit(), 1, "Submission must not be retried");
    assert_eq!(calls.get_change(), 0, "No polling after a failed submission");
}

#[tokio::test]
async fn empty_batch_is_not_submitted() {
    let table = device_table("url,ipaddress\ndev1,\n,10.0.0.2\n");
    let base = UrlBase::parse(".example.com").unwrap();
    let batch = ChangeBatch::from_csv(table.path(), &base, &BatchConfig::default()).unwrap();
    assert!(batch.is_empty());

    let provider = ScriptedProvider::example_com();
    let calls = provider.calls();
    let (engine, _events) = SyncEngine::new(Box::new(provider), default_sync()).unwrap();

    let err = engine.run(&batch, &base).await.unwrap_err();

    assert!(matches!(err, Error::SubmissionFailed(_)));
    assert_eq!(calls.submit(), 0);
}

#[tokio::test]
async fn dropped_listener_does_not_break_the_run() {
    let (batch, base) = example_batch();
    let provider = ScriptedProvider::example_com().in_sync_on_poll(1);
    let (engine, events) = SyncEngine::new(Box::new(provider), default_sync()).unwrap();
    drop(events);

    let report = engine.run(&batch, &base).await.unwrap();
    assert!(report.outcome.is_in_sync());
}
