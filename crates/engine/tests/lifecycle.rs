//! Single-pipeline admission, cancellation and drop behavior.

mod common;

use common::{Script, ScriptedClient, engine_with};
use std::sync::Arc;
use std::time::Duration;
use vigil_core::error::{ProviderError, SubmitError};
use vigil_core::history::HistorySnapshot;
use vigil_core::message::{MessageStatus, Role};
use vigil_engine::{ConversationEngine, PipelineState, SCANNING_NOTICE};

fn assert_settled(engine: &ConversationEngine) {
    let snapshot = engine.snapshot();
    assert!(snapshot.open_message().is_none(), "an open message remains");
    assert!(snapshot.iter().all(|m| !m.is_streaming()));
    assert_eq!(engine.state(), PipelineState::Idle);
    assert!(!engine.is_busy());
}

fn streaming_reply_is(snapshot: &HistorySnapshot, text: &str) -> bool {
    snapshot
        .last()
        .is_some_and(|m| m.is_streaming() && m.content == text)
}

#[tokio::test]
async fn second_directive_rejected_while_generating() {
    let client = Arc::new(ScriptedClient::new(vec![
        Script::Stall(vec!["partial"]),
        Script::Reply(vec!["done"]),
    ]));
    let engine = engine_with(client, Duration::ZERO);
    let mut rx = engine.subscribe();

    let pipeline = engine.submit("first").unwrap();
    let task = tokio::spawn(pipeline.run());
    rx.wait_for(|s| streaming_reply_is(s, "partial")).await.unwrap();

    assert_eq!(engine.submit("second").err(), Some(SubmitError::Busy));
    assert!(engine.snapshot().iter().all(|m| m.content != "second"));

    assert!(engine.cancel());
    let outcome = task.await.unwrap();
    assert_eq!(outcome.terminal, PipelineState::Cancelled);
    assert_settled(&engine);

    let next = engine.submit("second").unwrap().run().await;
    assert_eq!(next.terminal, PipelineState::Finalized);
}

#[tokio::test]
async fn cancel_mid_stream_freezes_partial_reply() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Stall(vec!["Sys"])]));
    let engine = engine_with(client, Duration::ZERO);
    let mut rx = engine.subscribe();

    let pipeline = engine.submit("status report").unwrap();
    let cancel = pipeline.cancel_handle();
    let task = tokio::spawn(pipeline.run());
    rx.wait_for(|s| streaming_reply_is(s, "Sys")).await.unwrap();

    cancel.cancel();
    cancel.cancel();
    let outcome = task.await.unwrap();

    assert_eq!(outcome.terminal, PipelineState::Cancelled);
    assert_eq!(outcome.trace.last(), Some(&PipelineState::Cancelled));
    assert!(outcome.trace.contains(&PipelineState::Generating));

    let snapshot = engine.snapshot();
    let replies: Vec<_> = snapshot.iter().filter(|m| m.role == Role::Assistant).collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].content, "Sys");
    assert_eq!(replies[0].status, MessageStatus::Cancelled);
    assert_settled(&engine);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_observation_delay_removes_notice() {
    let client = Arc::new(ScriptedClient::reply(vec!["unused"]));
    let engine = engine_with(client.clone(), Duration::from_secs(10));
    let mut rx = engine.subscribe();

    let task = tokio::spawn(engine.submit("architecture").unwrap().run());
    rx.wait_for(|s| {
        s.iter()
            .any(|m| m.role == Role::Notice && m.content.starts_with("Identified"))
    })
    .await
    .unwrap();

    assert!(engine.cancel());
    let outcome = task.await.unwrap();

    assert_eq!(outcome.terminal, PipelineState::Cancelled);
    assert_eq!(
        outcome.trace,
        vec![
            PipelineState::Submitted,
            PipelineState::Scanning,
            PipelineState::Cancelled,
        ]
    );
    assert_eq!(client.call_count(), 0);
    assert!(engine.snapshot().iter().all(|m| m.role != Role::Notice));
    assert_settled(&engine);
}

#[tokio::test(start_paused = true)]
async fn dropping_pipeline_mid_stream_cancels_it() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Stall(vec!["partial"])]));
    let engine = engine_with(client, Duration::ZERO);

    let pipeline = engine.submit("status report").unwrap();
    let timed_out = tokio::time::timeout(Duration::from_millis(50), pipeline.run()).await;
    assert!(timed_out.is_err());

    let snapshot = engine.snapshot();
    let last = snapshot.last().unwrap();
    assert_eq!(last.content, "partial");
    assert_eq!(last.status, MessageStatus::Cancelled);
    assert_settled(&engine);
}

#[tokio::test]
async fn dropping_pipeline_during_scan_removes_notice() {
    let client = Arc::new(ScriptedClient::reply(vec!["unused"]));
    let engine = engine_with(client, Duration::from_secs(10));
    let mut rx = engine.subscribe();

    let task = tokio::spawn(engine.submit("architecture").unwrap().run());
    rx.wait_for(|s| s.iter().any(|m| m.role == Role::Notice))
        .await
        .unwrap();
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(engine.snapshot().iter().all(|m| m.role != Role::Notice));
    assert_settled(&engine);
}

#[tokio::test]
async fn cancel_after_completion_is_noop() {
    let client = Arc::new(ScriptedClient::reply(vec!["done"]));
    let engine = engine_with(client, Duration::ZERO);

    let pipeline = engine.submit("status report").unwrap();
    let cancel = pipeline.cancel_handle();
    let outcome = pipeline.run().await;
    let version = engine.snapshot().version;

    cancel.cancel();
    assert!(!engine.cancel());
    assert_eq!(outcome.terminal, PipelineState::Finalized);
    assert_eq!(engine.snapshot().version, version);
    assert_settled(&engine);
}

#[tokio::test]
async fn every_terminal_path_leaves_history_settled() {
    let client = Arc::new(ScriptedClient::new(vec![
        Script::Reply(vec!["a", "b"]),
        Script::FailAfter(vec!["x"], ProviderError::StreamInterrupted("eof".into())),
        Script::FailStart(ProviderError::RateLimited {
            retry_after_secs: 5,
        }),
        Script::FailStart(ProviderError::NotConfigured("gone".into())),
    ]));
    let engine = engine_with(client, Duration::ZERO);

    let mut terminals = Vec::new();
    for directive in ["one", "two", "three", "four"] {
        let outcome = engine.submit(directive).unwrap().run().await;
        terminals.push(outcome.terminal);
        assert_settled(&engine);
    }
    assert_eq!(
        terminals,
        vec![
            PipelineState::Finalized,
            PipelineState::Failed,
            PipelineState::Failed,
            PipelineState::FallbackOffline,
        ]
    );

    // User messages keep submission order
    let users: Vec<String> = engine
        .snapshot()
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(users, vec!["one", "two", "three", "four"]);
}

#[tokio::test]
async fn scanning_notice_is_first_visible_step() {
    let client = Arc::new(ScriptedClient::reply(vec!["ok"]));
    let engine = engine_with(client, Duration::ZERO);
    let mut events = engine.events();

    engine.submit("status").unwrap().run().await;

    let first_notice = common::snapshots(&common::drain(&mut events))
        .into_iter()
        .find_map(|s| s.iter().find(|m| m.role == Role::Notice).cloned());
    assert_eq!(first_notice.unwrap().content, SCANNING_NOTICE);
}
