use crate::actors::messages::{AppError, SessionMessage};
use crate::actors::traits::ChatTransport;
use crate::actors::transport::HttpChatTransport;
use crate::brain::intensity;
use crate::brain::{PresetMatcher, SuggestionEngine};
use crate::config::ChatConfig;
use crate::models::{ChatView, ConversationMessage, Phase, SubmitOutcome};
use crate::rate_limiter::RateLimiter;
use crate::stream::{RenderFrame, StreamAccumulator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Shown when the request window is full.
pub const RATE_LIMIT_MESSAGE: &str = "whoa, slow down. give it a minute and try again.";
/// Shown when the stream ended without any text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "hmm, nothing came back. try asking again?";
/// Shown when the transport failed.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "...";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(300);

/// A handle to a chat session actor.
///
/// This is the primary entry point for driving a conversation. The actor owns
/// the history, the rate window and the turn counter; the handle only sends
/// messages and exposes the published [`ChatView`].
#[derive(Clone)]
pub struct ChatSessionHandle {
    id: String,
    sender: mpsc::Sender<SessionMessage>,
    /// Set from an accepted submit until its turn has settled.
    busy: Arc<AtomicBool>,
    view: watch::Receiver<ChatView>,
}

impl ChatSessionHandle {
    /// Creates a session talking to the configured HTTP endpoint.
    ///
    /// Must be called inside a Tokio runtime; the actor is spawned immediately.
    pub fn new(config: &ChatConfig) -> Result<Self, AppError> {
        let transport = HttpChatTransport::from_config(config)?;
        info!(endpoint = %transport.endpoint(), "Using HTTP chat transport");
        let presets = match &config.presets_path {
            Some(path) => PresetMatcher::from_json_file(path)?,
            None => PresetMatcher::default(),
        };
        Ok(Self::new_with_parts(
            Arc::new(transport),
            presets,
            SuggestionEngine::default(),
            config,
        ))
    }

    /// Creates a session with an explicit transport, preset table and suggestion engine.
    pub fn new_with_parts<T: ChatTransport>(
        transport: Arc<T>,
        presets: PresetMatcher,
        suggestions: SuggestionEngine,
        config: &ChatConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let busy = Arc::new(AtomicBool::new(false));
        let (view_tx, view) = watch::channel(ChatView {
            suggestions: suggestions.initial().to_vec(),
            ..ChatView::default()
        });
        let id = Uuid::new_v4().to_string();

        let runner = SessionRunner {
            id: id.clone(),
            receiver,
            transport,
            presets,
            suggestions,
            limiter: RateLimiter::new(config.max_requests, config.window()),
            typing_delay: config.typing_delay(),
            busy: Arc::clone(&busy),
            view_tx,
            history: Vec::new(),
            turn_count: 0,
        };
        tokio::spawn(async move { runner.run().await });

        Self {
            id,
            sender,
            busy,
            view,
        }
    }

    /// Submits one user message and waits until its turn has settled.
    ///
    /// Empty or whitespace-only input is ignored. A submit while another one
    /// is in flight is rejected with [`AppError::Busy`]. Rate limiting, empty
    /// answers and transport failures are not errors: they come back as
    /// [`SubmitOutcome`] variants.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn submit(&self, input: &str) -> Result<SubmitOutcome, AppError> {
        let content = input.trim();
        if content.is_empty() {
            debug!("Ignoring empty submit");
            return Ok(SubmitOutcome::Ignored);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected submit while a request is in flight");
            return Err(AppError::Busy);
        }

        let (send, recv) = oneshot::channel();
        let msg = SessionMessage::Submit {
            content: content.to_string(),
            responder: send,
        };
        if let Err(e) = self.sender.send(msg).await {
            self.busy.store(false, Ordering::Release);
            return Err(AppError::Actor(e.to_string()));
        }
        timeout(SUBMIT_TIMEOUT, recv).await?.map_err(|e| {
            // The runner dropped the turn without settling it (stopped or panicked).
            self.busy.store(false, Ordering::Release);
            AppError::Actor(e.to_string())
        })
    }

    /// Snapshot of the conversation history.
    pub async fn history(&self) -> Result<Vec<ConversationMessage>, AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(SessionMessage::History { responder: send })
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(SUBMIT_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// Stops the actor after any turn in progress.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SessionMessage::Shutdown)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// The latest published view.
    pub fn view(&self) -> ChatView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every view update.
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

// --- Actor Runner ---
struct SessionRunner<T: ChatTransport> {
    id: String,
    receiver: mpsc::Receiver<SessionMessage>,
    transport: Arc<T>,
    presets: PresetMatcher,
    suggestions: SuggestionEngine,
    limiter: RateLimiter,
    typing_delay: Duration,
    busy: Arc<AtomicBool>,
    view_tx: watch::Sender<ChatView>,
    history: Vec<ConversationMessage>,
    turn_count: usize,
}

impl<T: ChatTransport> SessionRunner<T> {
    async fn run(mut self) {
        info!(session_id = %self.id, "Chat session started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SessionMessage::Submit { content, responder } => {
                    let outcome = self.handle_submit(content).await;
                    self.settle();
                    let _ = responder.send(outcome);
                }
                SessionMessage::History { responder } => {
                    let _ = responder.send(self.history.clone());
                }
                SessionMessage::Shutdown => {
                    info!(session_id = %self.id, "Chat session shutting down...");
                    break;
                }
            }
        }
        info!(session_id = %self.id, "Chat session stopped");
    }

    #[instrument(skip(self), fields(session_id = %self.id))]
    async fn handle_submit(&mut self, content: String) -> SubmitOutcome {
        self.view_tx.send_modify(|view| {
            view.phase = Phase::Checking;
            view.answer.clear();
            view.segments.clear();
            view.is_intense = false;
        });
        self.history.push(ConversationMessage::user(content.as_str()));

        if let Some(answer) = self.presets.lookup(&content).map(str::to_string) {
            info!("Answering from presets");
            return self.reveal_preset(answer).await;
        }

        let now = Instant::now();
        if !self.limiter.allow(now) {
            let retry_after = self.limiter.retry_after(now);
            let in_window = self.limiter.in_window();
            warn!(in_window, ?retry_after, "Rate limit reached");
            self.set_phase(Phase::RateLimited);
            self.show(RATE_LIMIT_MESSAGE);
            return SubmitOutcome::RateLimited;
        }
        self.limiter.record(now);

        self.stream_answer().await
    }

    /// Reveals a canned answer word by word, then commits it.
    async fn reveal_preset(&mut self, answer: String) -> SubmitOutcome {
        self.set_phase(Phase::Preset);

        let mut accumulator = StreamAccumulator::new();
        for (i, word) in answer.split_inclusive(char::is_whitespace).enumerate() {
            if i > 0 && !self.typing_delay.is_zero() {
                sleep(self.typing_delay).await;
            }
            self.publish(accumulator.push(word));
        }

        let committed = intensity::clean(&answer).to_string();
        self.history.push(ConversationMessage::assistant(committed.as_str()));
        self.turn_count += 1;
        SubmitOutcome::Preset { answer: committed }
    }

    async fn stream_answer(&mut self) -> SubmitOutcome {
        self.set_phase(Phase::Streaming);

        let transport = Arc::clone(&self.transport);
        let (chunk_tx, mut chunk_rx) = mpsc::channel(32);
        let request = transport.stream_chat(self.history.clone(), chunk_tx);

        let mut accumulator = StreamAccumulator::new();
        let mut chunk_error = None;
        let view_tx = &self.view_tx;
        let drain = async {
            while let Some(chunk) = chunk_rx.recv().await {
                match chunk {
                    Ok(text) => {
                        debug!(bytes = text.len(), "Received chunk");
                        publish_frame(view_tx, accumulator.push(&text));
                    }
                    Err(e) => {
                        chunk_error = Some(e);
                        break;
                    }
                }
            }
        };
        let (result, ()) = tokio::join!(request, drain);

        if let Some(e) = chunk_error.or_else(|| result.err()) {
            error!("Chat stream failed: {}", e);
            self.show(TRANSPORT_FAILURE_MESSAGE);
            return SubmitOutcome::TransportFailed;
        }

        match accumulator.finish() {
            Some(answer) => {
                self.history
                    .push(ConversationMessage::assistant(answer.text.as_str()));
                self.turn_count += 1;
                info!(
                    turn = self.turn_count,
                    intense = answer.is_intense,
                    "Answer settled"
                );
                SubmitOutcome::Answered {
                    text: answer.text,
                    is_intense: answer.is_intense,
                }
            }
            None => {
                warn!("Chat stream ended without text");
                self.show(EMPTY_RESPONSE_MESSAGE);
                SubmitOutcome::EmptyResponse
            }
        }
    }

    fn set_phase(&self, phase: Phase) {
        self.view_tx.send_modify(|view| view.phase = phase);
    }

    fn publish(&self, frame: RenderFrame) {
        publish_frame(&self.view_tx, frame);
    }

    /// Replaces the answer with a fixed local message.
    fn show(&self, message: &str) {
        self.publish(RenderFrame::render(message));
    }

    /// Ends the turn: suggestions for the shown answer, phase back to ready.
    fn settle(&mut self) {
        let turn_count = self.turn_count;
        let topic = self
            .suggestions
            .classify(&self.view_tx.borrow().answer, turn_count);
        debug!(%topic, turn = turn_count, "Turn settled");

        let suggestions = self.suggestions.suggestions_for(topic).to_vec();
        self.view_tx.send_modify(|view| {
            view.phase = Phase::Settled;
            view.turn_count = turn_count;
            view.suggestions = suggestions;
        });
        self.busy.store(false, Ordering::Release);
    }
}

fn publish_frame(view_tx: &watch::Sender<ChatView>, frame: RenderFrame) {
    view_tx.send_modify(|view| {
        view.answer = frame.display_text;
        view.segments = frame.segments;
        view.is_intense = frame.is_intense;
    });
}
