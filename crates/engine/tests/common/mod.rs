//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use vigil_core::error::ProviderError;
use vigil_core::history::HistorySnapshot;
use vigil_core::memory::{Fragment, Provenance};
use vigil_core::provider::{
    GenerationClient, GenerationRequest, IncrementStream, StreamChunk, Usage, stream_from,
};
use vigil_engine::{ConversationEngine, EngineEvent, EngineSettings, PipelineState};
use vigil_memory::{InMemoryStore, KeywordFilter};

/// What the scripted client does on one `generate` call.
pub enum Script {
    /// Stream the increments, then finish.
    Reply(Vec<&'static str>),
    /// Stream the increments, then report a fault.
    FailAfter(Vec<&'static str>, ProviderError),
    /// Fail before producing any increment.
    FailStart(ProviderError),
    /// Stream the increments, then stay silent until cancelled.
    Stall(Vec<&'static str>),
}

/// A generation client that plays back scripted responses in order.
///
/// Panics if more calls are made than scripts provided.
pub struct ScriptedClient {
    available: bool,
    scripts: Mutex<VecDeque<Script>>,
    prompts: Mutex<Vec<String>>,
    stalled: Mutex<Vec<mpsc::Sender<Result<StreamChunk, ProviderError>>>>,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            available: true,
            scripts: Mutex::new(scripts.into()),
            prompts: Mutex::new(Vec::new()),
            stalled: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(increments: Vec<&'static str>) -> Self {
        Self::new(vec![Script::Reply(increments)])
    }

    /// A client whose backend is not configured.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(vec![])
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, request: GenerationRequest) -> Result<IncrementStream, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedClient: no more scripts");

        let text = |increments: Vec<&'static str>| {
            increments
                .into_iter()
                .map(|t| Ok(StreamChunk::text(t)))
                .collect::<Vec<_>>()
        };

        match script {
            Script::Reply(increments) => {
                let mut items = text(increments);
                items.push(Ok(StreamChunk::finished(Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }))));
                Ok(stream_from(items))
            }
            Script::FailAfter(increments, error) => {
                let mut items = text(increments);
                items.push(Err(error));
                Ok(stream_from(items))
            }
            Script::FailStart(error) => Err(error),
            Script::Stall(increments) => {
                let (tx, rx) = mpsc::channel(16);
                for item in text(increments) {
                    tx.try_send(item).unwrap();
                }
                // Keep the sender alive so the stream never ends on its own
                self.stalled.lock().unwrap().push(tx);
                Ok(rx)
            }
        }
    }
}

pub fn fragment(id: &str, provenance: Provenance, body: &str, tags: &[&str]) -> Fragment {
    Fragment {
        id: id.into(),
        provenance,
        title: id.into(),
        body: body.into(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 4, 9, 0, 0).unwrap(),
        semantic_score: 0.9,
        lexical_score: 0.4,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// A small archive: one architecture document, one log, one unrelated note.
pub fn archive() -> InMemoryStore {
    InMemoryStore::with_fragments(vec![
        fragment(
            "frag_001",
            Provenance::Document,
            "Migrate the relay mesh onto the new backbone by Q3.",
            &["architecture", "roadmap"],
        ),
        fragment(
            "frag_002",
            Provenance::Log,
            "Coolant pressure nominal on night shift.",
            &["ops"],
        ),
        fragment(
            "frag_003",
            Provenance::Conversation,
            "Cafeteria menu discussion.",
            &[],
        ),
    ])
    .unwrap()
}

pub fn engine_with(client: Arc<ScriptedClient>, delay: Duration) -> ConversationEngine {
    let settings = EngineSettings {
        observation_delay: delay,
        ..EngineSettings::default()
    };
    ConversationEngine::new(
        Arc::new(archive()),
        Arc::new(KeywordFilter::new()),
        client,
        settings,
    )
}

/// Drain every event published so far.
pub fn drain(rx: &mut broadcast::Receiver<Arc<EngineEvent>>) -> Vec<Arc<EngineEvent>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn snapshots(events: &[Arc<EngineEvent>]) -> Vec<HistorySnapshot> {
    events
        .iter()
        .filter_map(|e| match e.as_ref() {
            EngineEvent::HistoryChanged { snapshot } => Some(snapshot.clone()),
            EngineEvent::StateChanged { .. } => None,
        })
        .collect()
}

pub fn states(events: &[Arc<EngineEvent>]) -> Vec<PipelineState> {
    events
        .iter()
        .filter_map(|e| match e.as_ref() {
            EngineEvent::StateChanged { state, .. } => Some(*state),
            EngineEvent::HistoryChanged { .. } => None,
        })
        .collect()
}
