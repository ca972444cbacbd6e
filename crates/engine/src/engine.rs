//! The conversation engine — one directive at a time through scan,
//! assemble, generate and reconcile.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ─submit─▶ Submitted ─▶ Scanning ─▶ ContextReady ─┬─▶ Generating ─┬─▶ Finalized
//!                                                       │               ├─▶ Failed
//!                                                       │               └─▶ FallbackOffline
//!                                                       └─▶ FallbackOffline
//! (any non-terminal state) ─cancel / drop─▶ Cancelled
//! (any terminal state) ─▶ Idle
//! ```
//!
//! [`ConversationEngine::submit`] is synchronous: it validates the
//! directive, claims the single pipeline slot, appends the user message and
//! hands back a [`Pipeline`]. Driving the pipeline with [`Pipeline::run`]
//! performs the rest. Every history change goes through one mutation
//! point, so observers never see a half-applied step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use vigil_config::AppConfig;
use vigil_core::error::{HistoryError, ProviderError, SubmitError};
use vigil_core::history::{History, HistorySnapshot, Mutation};
use vigil_core::memory::{MemoryStore, RelevanceFilter};
use vigil_core::message::{MessageId, MessageStatus, Role};
use vigil_core::provider::{GenerationClient, GenerationRequest, Usage};

use crate::context::{ContextAssembler, ContextLimit};
use crate::event::{EngineEvent, EventBus};
use crate::prompt::{DEFAULT_PERSONA, compose_prompt};
use crate::state::{PipelineOutcome, PipelineState};

/// Shown while the relevance filter runs.
pub const SCANNING_NOTICE: &str = "Scanning memory...";

/// Body of the assistant message when no backend is usable.
pub const OFFLINE_NOTICE: &str = "OFFLINE MODE: no generation backend is configured. \
Set VIGIL_API_KEY (or OPENROUTER_API_KEY / OPENAI_API_KEY) to enable responses.";

/// Body of the assistant message appended after a generation fault.
pub const ERROR_NOTICE: &str = "ERROR: the link to the generation backend failed. \
Resubmit the directive to retry.";

/// Shown after a scan that selected `count` fragments.
pub fn identified_notice(count: usize) -> String {
    format!("Identified {count} relevant memory fragments.")
}

// ── Settings ──────────────────────────────────────────────────────────────

/// Tuning for a [`ConversationEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// How long the "Identified N ..." notice stays before it is removed.
    pub observation_delay: Duration,
    pub limit: ContextLimit,
    pub persona: String,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            model,
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            observation_delay: config.engine.observation_delay(),
            limit: ContextLimit::from_config(&config.engine),
            persona: config
                .engine
                .persona
                .clone()
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        }
    }

    /// Same settings without the observation pause.
    pub fn without_delay(mut self) -> Self {
        self.observation_delay = Duration::ZERO;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────

/// Requests cancellation of one pipeline. Cloneable and idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Ask the pipeline to stop. A no-op once it has finished.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }
}

/// Resolves once cancellation is requested.
async fn cancellation(signal: &mut watch::Receiver<bool>) {
    if signal.wait_for(|cancelled| *cancelled).await.is_err() {
        // Sender gone: cancellation can no longer arrive
        std::future::pending::<()>().await;
    }
}

// ── Engine ────────────────────────────────────────────────────────────────

struct Shared {
    store: Arc<dyn MemoryStore>,
    filter: Arc<dyn RelevanceFilter>,
    client: Arc<dyn GenerationClient>,
    assembler: ContextAssembler,
    settings: EngineSettings,
    history: Mutex<History>,
    snapshots: watch::Sender<HistorySnapshot>,
    state: watch::Sender<PipelineState>,
    events: EventBus,
    busy: AtomicBool,
    active: Mutex<Option<CancelHandle>>,
}

impl Shared {
    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> MutexGuard<'_, Option<CancelHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The single mutation point. Publishes the new snapshot while the lock
    /// is held so observers see mutations in order.
    fn mutate(&self, mutation: Mutation) -> Result<MessageId, HistoryError> {
        let mut history = self.history();
        let id = history.apply(mutation)?;
        let snapshot = history.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        self.events.publish(EngineEvent::HistoryChanged { snapshot });
        Ok(id)
    }

    fn is_blank(&self, id: MessageId) -> bool {
        self.history()
            .get(id)
            .is_none_or(|message| message.content.is_empty())
    }

    fn set_state(&self, pipeline_id: Uuid, state: PipelineState) {
        self.state.send_replace(state);
        self.events.publish(EngineEvent::StateChanged {
            pipeline_id,
            state,
            timestamp: Utc::now(),
        });
    }

    fn release(&self) {
        self.active().take();
        self.busy.store(false, Ordering::Release);
    }
}

/// Owns the conversation history and runs one pipeline at a time.
///
/// Cloning is cheap; clones share the same history and pipeline slot.
#[derive(Clone)]
pub struct ConversationEngine {
    shared: Arc<Shared>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        filter: Arc<dyn RelevanceFilter>,
        client: Arc<dyn GenerationClient>,
        settings: EngineSettings,
    ) -> Self {
        let history = History::new();
        let (snapshots, _) = watch::channel(history.snapshot());
        let (state, _) = watch::channel(PipelineState::Idle);

        Self {
            shared: Arc::new(Shared {
                store,
                filter,
                client,
                assembler: ContextAssembler::new(),
                settings,
                history: Mutex::new(history),
                snapshots,
                state,
                events: EventBus::default(),
                busy: AtomicBool::new(false),
                active: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.shared.settings
    }

    /// Name of the generation client in use.
    pub fn client_name(&self) -> &str {
        self.shared.client.name()
    }

    /// Accept a directive and start a pipeline for it.
    ///
    /// Rejected directives never reach the history.
    pub fn submit(&self, directive: impl Into<String>) -> Result<Pipeline, SubmitError> {
        let directive = directive.into();
        if directive.trim().is_empty() {
            return Err(SubmitError::EmptyDirective);
        }

        // Slot and cancel handle are claimed under one lock.
        let cancel = CancelHandle::new();
        {
            let mut active = self.shared.active();
            if self
                .shared
                .busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!("Directive rejected: a pipeline is in flight");
                return Err(SubmitError::Busy);
            }
            *active = Some(cancel.clone());
        }

        let user_message = match self.shared.mutate(Mutation::append(
            Role::User,
            directive.clone(),
            MessageStatus::Complete,
        )) {
            Ok(id) => id,
            Err(e) => {
                self.shared.release();
                return Err(e.into());
            }
        };

        let id = Uuid::new_v4();
        self.shared.set_state(id, PipelineState::Submitted);
        info!(pipeline = %id, chars = directive.len(), "Directive submitted");

        Ok(Pipeline {
            id,
            shared: Arc::clone(&self.shared),
            directive,
            user_message,
            cancel,
            trace: vec![PipelineState::Submitted],
            open: None,
            assistant: None,
            fragments: 0,
            fragments_used: 0,
            usage: None,
            error: None,
            finished: false,
        })
    }

    /// Cancel the in-flight pipeline, if any. Returns whether one existed.
    pub fn cancel(&self) -> bool {
        match self.shared.active().as_ref() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.shared.history().snapshot()
    }

    /// Latest history snapshot, updated after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.shared.state.subscribe()
    }

    /// Every history change and state transition, in order.
    pub fn events(&self) -> broadcast::Receiver<Arc<EngineEvent>> {
        self.shared.events.subscribe()
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum OpenMessage {
    Notice(MessageId),
    Reply(MessageId),
}

/// One accepted directive on its way to a terminal state.
///
/// Dropping a pipeline before it finishes cancels it: the open notice is
/// removed, a streaming reply is frozen as `Cancelled`, and the engine
/// returns to `Idle`.
pub struct Pipeline {
    id: Uuid,
    shared: Arc<Shared>,
    directive: String,
    user_message: MessageId,
    cancel: CancelHandle,
    trace: Vec<PipelineState>,
    open: Option<OpenMessage>,
    assistant: Option<MessageId>,
    fragments: usize,
    fragments_used: usize,
    usage: Option<Usage>,
    error: Option<ProviderError>,
    finished: bool,
}

impl Pipeline {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn user_message(&self) -> MessageId {
        self.user_message
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Drive the pipeline to a terminal state.
    pub async fn run(mut self) -> PipelineOutcome {
        info!(pipeline = %self.id, "Pipeline started");
        let mut cancelled = self.cancel.subscribe();

        let terminal = match self.drive(&mut cancelled).await {
            Ok(terminal) => terminal,
            Err(e) => {
                warn!(pipeline = %self.id, "History rejected a pipeline step: {e}");
                if let Err(e) = self.close_open(MessageStatus::Failed) {
                    warn!(pipeline = %self.id, "Could not close open message: {e}");
                }
                PipelineState::Failed
            }
        };

        self.finish(terminal)
    }

    async fn drive(
        &mut self,
        cancelled: &mut watch::Receiver<bool>,
    ) -> Result<PipelineState, HistoryError> {
        if self.cancel.is_cancelled() {
            return Ok(PipelineState::Cancelled);
        }
        let shared = Arc::clone(&self.shared);

        // ── Step 1: Scan memory ──
        self.enter(PipelineState::Scanning);
        let notice = shared.mutate(Mutation::append(
            Role::Notice,
            SCANNING_NOTICE,
            MessageStatus::Complete,
        ))?;
        self.open = Some(OpenMessage::Notice(notice));

        let scanned = tokio::select! {
            biased;
            _ = cancellation(cancelled) => None,
            fragments = shared.filter.select(&self.directive, shared.store.as_ref()) => Some(fragments),
        };
        let Some(selected) = scanned else {
            return self.cancelled();
        };
        self.fragments = selected.len();
        debug!(pipeline = %self.id, fragments = self.fragments, "Memory scan complete");

        // ── Step 2: Report the scan ──
        if self.fragments > 0 {
            shared.mutate(Mutation::Replace {
                id: notice,
                content: identified_notice(self.fragments),
                status: MessageStatus::Complete,
            })?;

            let delay = shared.settings.observation_delay;
            if !delay.is_zero() {
                let elapsed = tokio::select! {
                    biased;
                    _ = cancellation(cancelled) => false,
                    _ = tokio::time::sleep(delay) => true,
                };
                if !elapsed {
                    return self.cancelled();
                }
            }
        }
        shared.mutate(Mutation::Remove { id: notice })?;
        self.open = None;
        self.enter(PipelineState::ContextReady);

        // ── Step 3: Bound, assemble, compose ──
        let limited = shared.settings.limit.apply(selected);
        self.fragments_used = limited.kept.len();
        let context = shared.assembler.assemble(&limited.kept);
        let prompt = compose_prompt(&shared.settings.persona, &context.block, &self.directive);
        debug!(
            pipeline = %self.id,
            used = self.fragments_used,
            dropped = limited.dropped.len(),
            prompt_chars = prompt.len(),
            "Prompt composed"
        );

        let reply = shared.mutate(Mutation::append(
            Role::Assistant,
            "",
            MessageStatus::Streaming,
        ))?;
        self.open = Some(OpenMessage::Reply(reply));
        self.assistant = Some(reply);

        // ── Step 4: Start generation ──
        if !shared.client.is_available() {
            return self.offline(reply, None);
        }
        self.enter(PipelineState::Generating);

        let mut request = GenerationRequest::new(shared.settings.model.clone(), prompt);
        request.temperature = shared.settings.temperature;
        request.max_tokens = shared.settings.max_tokens;

        let started = tokio::select! {
            biased;
            _ = cancellation(cancelled) => None,
            result = shared.client.generate(request) => Some(result),
        };
        let mut stream = match started {
            None => return self.cancelled(),
            Some(Ok(stream)) => stream,
            Some(Err(e)) if e.is_precondition() => return self.offline(reply, Some(e)),
            Some(Err(e)) => return self.failed(e),
        };

        // ── Step 5: Consume increments ──
        loop {
            let next = tokio::select! {
                biased;
                _ = cancellation(cancelled) => None,
                item = stream.recv() => Some(item),
            };
            match next {
                None => return self.cancelled(),
                Some(None) => break,
                Some(Some(Err(e))) => return self.failed(e),
                Some(Some(Ok(chunk))) => {
                    if let Some(text) = chunk.content.filter(|t| !t.is_empty()) {
                        trace!(pipeline = %self.id, chars = text.len(), "Increment received");
                        shared.mutate(Mutation::AppendText { id: reply, text })?;
                    }
                    if chunk.usage.is_some() {
                        self.usage = chunk.usage;
                    }
                    if chunk.done {
                        break;
                    }
                }
            }
        }

        shared.mutate(Mutation::SetStatus {
            id: reply,
            status: MessageStatus::Complete,
        })?;
        self.open = None;
        Ok(PipelineState::Finalized)
    }

    fn offline(
        &mut self,
        reply: MessageId,
        error: Option<ProviderError>,
    ) -> Result<PipelineState, HistoryError> {
        info!(pipeline = %self.id, client = self.shared.client.name(), "No usable backend; answering offline");
        self.shared.mutate(Mutation::Replace {
            id: reply,
            content: OFFLINE_NOTICE.into(),
            status: MessageStatus::Complete,
        })?;
        self.open = None;
        self.error = error;
        Ok(PipelineState::FallbackOffline)
    }

    fn failed(&mut self, error: ProviderError) -> Result<PipelineState, HistoryError> {
        warn!(pipeline = %self.id, error = %error, "Generation failed");
        self.close_open(MessageStatus::Failed)?;
        let notice = self.shared.mutate(Mutation::append(
            Role::Assistant,
            ERROR_NOTICE,
            MessageStatus::Failed,
        ))?;
        self.assistant = Some(notice);
        self.error = Some(error);
        Ok(PipelineState::Failed)
    }

    fn cancelled(&mut self) -> Result<PipelineState, HistoryError> {
        info!(pipeline = %self.id, "Pipeline cancelled");
        self.close_open(MessageStatus::Cancelled)?;
        Ok(PipelineState::Cancelled)
    }

    /// Remove an open notice, or freeze an open reply with `status`.
    /// A failed reply with no text is removed instead.
    fn close_open(&mut self, status: MessageStatus) -> Result<(), HistoryError> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        match open {
            OpenMessage::Notice(id) => {
                self.shared.mutate(Mutation::Remove { id })?;
            }
            OpenMessage::Reply(id) => {
                if status == MessageStatus::Failed && self.shared.is_blank(id) {
                    self.shared.mutate(Mutation::Remove { id })?;
                    self.assistant = None;
                } else {
                    self.shared.mutate(Mutation::SetStatus { id, status })?;
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(pipeline = %self.id, state = %state, "Pipeline transition");
        self.trace.push(state);
        self.shared.set_state(self.id, state);
    }

    fn finish(&mut self, terminal: PipelineState) -> PipelineOutcome {
        self.enter(terminal);
        self.finished = true;
        self.shared.set_state(self.id, PipelineState::Idle);
        self.shared.release();

        info!(
            pipeline = %self.id,
            terminal = %terminal,
            fragments = self.fragments,
            "Pipeline finished"
        );

        PipelineOutcome {
            pipeline_id: self.id,
            terminal,
            trace: std::mem::take(&mut self.trace),
            fragments: self.fragments,
            fragments_used: self.fragments_used,
            user_message: self.user_message,
            assistant: self.assistant,
            usage: self.usage.take(),
            error: self.error.take(),
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!(pipeline = %self.id, "Pipeline dropped before finishing");
        if let Err(e) = self.close_open(MessageStatus::Cancelled) {
            warn!(pipeline = %self.id, "Could not close open message: {e}");
        }
        self.finish(PipelineState::Cancelled);
    }
}
