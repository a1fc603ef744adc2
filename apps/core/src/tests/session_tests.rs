use crate::actors::messages::AppError;
use crate::actors::session::{
    ChatSessionHandle, EMPTY_RESPONSE_MESSAGE, RATE_LIMIT_MESSAGE, TRANSPORT_FAILURE_MESSAGE,
};
use crate::actors::traits::ChatTransport;
use crate::brain::{PresetMatcher, SuggestionEngine};
use crate::config::ChatConfig;
use crate::markdown::SegmentKind;
use crate::models::{ChatRole, ConversationMessage, Phase, SubmitOutcome};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep, timeout, Duration};

// --- Mock Components ---

struct ScriptedTransport {
    chunks: Vec<Result<String, AppError>>,
    result: Result<(), AppError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ConversationMessage>>>,
}

impl ScriptedTransport {
    fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Ok(c.to_string())).collect(),
            result: Ok(()),
            gate: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: AppError) -> Self {
        Self {
            result: Err(error),
            ..Self::new(&[])
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Vec<ConversationMessage> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn stream_chat(
        &self,
        messages: Vec<ConversationMessage>,
        chunk_sender: mpsc::Sender<Result<String, AppError>>,
    ) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        for chunk in &self.chunks {
            if chunk_sender.send(chunk.clone()).await.is_err() {
                break;
            }
        }
        self.result.clone()
    }
}

// --- Test Setup ---

fn test_config(max_requests: usize) -> ChatConfig {
    ChatConfig {
        max_requests,
        typing_delay_ms: 0,
        ..ChatConfig::default()
    }
}

fn start(transport: Arc<ScriptedTransport>, max_requests: usize) -> ChatSessionHandle {
    ChatSessionHandle::new_with_parts(
        transport,
        PresetMatcher::default(),
        SuggestionEngine::default(),
        &test_config(max_requests),
    )
}

// --- Tests ---

#[tokio::test]
async fn test_streamed_answer_is_committed() {
    // 1. Arrange
    let transport = Arc::new(ScriptedTransport::new(&["yo, the **sam", "sung** project ", "was fun"]));
    let handle = start(transport.clone(), 10);

    // 2. Act
    let outcome = handle.submit("  what did you build?  ").await.unwrap();

    // 3. Assert
    assert_eq!(
        outcome,
        SubmitOutcome::Answered {
            text: "yo, the **samsung** project was fun".to_string(),
            is_intense: false,
        }
    );

    let history = handle.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], ConversationMessage::user("what did you build?"));
    assert_eq!(history[1].role, ChatRole::Assistant);

    let view = handle.view();
    assert_eq!(view.phase, Phase::Settled);
    assert_eq!(view.turn_count, 1);
    assert!(view
        .segments
        .iter()
        .any(|s| s.kind == SegmentKind::Bold && s.content == "samsung"));
    assert_eq!(view.suggestions[0], "tell me about samsung");
    assert!(!handle.is_busy());
}

#[tokio::test]
async fn test_transport_receives_history_with_new_message() {
    let transport = Arc::new(ScriptedTransport::new(&["ok"]));
    let handle = start(transport.clone(), 10);

    handle.submit("first").await.unwrap();
    handle.submit("second").await.unwrap();

    let request = transport.last_request();
    assert_eq!(
        request,
        vec![
            ConversationMessage::user("first"),
            ConversationMessage::assistant("ok"),
            ConversationMessage::user("second"),
        ]
    );
}

#[tokio::test]
async fn test_intensity_marker_never_reaches_history() {
    let transport = Arc::new(ScriptedTransport::new(&["!!", "!! get ", "a life"]));
    let handle = start(transport, 10);

    let outcome = handle.submit("you're mid").await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Answered {
            text: "get a life".to_string(),
            is_intense: true,
        }
    );
    let history = handle.history().await.unwrap();
    assert_eq!(history[1].content, "get a life");

    let view = handle.view();
    assert!(view.is_intense);
    assert_eq!(view.answer, "get a life");
}

#[tokio::test]
async fn test_empty_input_is_ignored() {
    let transport = Arc::new(ScriptedTransport::new(&["never"]));
    let handle = start(transport.clone(), 10);

    assert_eq!(handle.submit("").await.unwrap(), SubmitOutcome::Ignored);
    assert_eq!(handle.submit(" \n\t ").await.unwrap(), SubmitOutcome::Ignored);

    assert_eq!(transport.calls(), 0);
    assert!(handle.history().await.unwrap().is_empty());
    assert_eq!(handle.view().phase, Phase::Idle);
}

#[tokio::test]
async fn test_preset_bypasses_rate_limiter() {
    let transport = Arc::new(ScriptedTransport::new(&["streamed"]));
    let handle = start(transport.clone(), 1);

    for question in ["Who Are You?", "who are you?", "WHO ARE YOU?"] {
        let outcome = handle.submit(question).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Preset { .. }));
    }
    assert_eq!(transport.calls(), 0);
    assert_eq!(handle.view().turn_count, 3);

    // The single allowed request is still available.
    let outcome = handle.submit("anything new?").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Answered { .. }));
    assert_eq!(transport.calls(), 1);

    let outcome = handle.submit("and now?").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::RateLimited);
    assert_eq!(transport.calls(), 1);

    // Presets keep working once the window is full.
    let outcome = handle.submit("what do you do?").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Preset { .. }));
}

#[tokio::test]
async fn test_eleventh_request_is_rate_limited() {
    let transport = Arc::new(ScriptedTransport::new(&["sure"]));
    let handle = start(transport.clone(), 10);

    for i in 0..10 {
        let outcome = handle.submit(&format!("question number {}", i)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Answered { .. }));
    }

    let outcome = handle.submit("question number 10").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::RateLimited);
    assert_eq!(transport.calls(), 10);
    let view = handle.view();
    assert_eq!(view.answer, RATE_LIMIT_MESSAGE);
    assert_eq!(view.phase, Phase::Settled);
    assert_eq!(view.turn_count, 10);

    // The user message stays, no assistant message is added.
    let history = handle.history().await.unwrap();
    assert_eq!(history.len(), 21);
    assert_eq!(history[20], ConversationMessage::user("question number 10"));
}

#[tokio::test]
async fn test_empty_stream_is_not_an_assistant_turn() {
    let transport = Arc::new(ScriptedTransport::new(&["  ", "\n"]));
    let handle = start(transport, 10);

    let outcome = handle.submit("hello?").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::EmptyResponse);
    let history = handle.history().await.unwrap();
    assert_eq!(history, vec![ConversationMessage::user("hello?")]);
    let view = handle.view();
    assert_eq!(view.answer, EMPTY_RESPONSE_MESSAGE);
    assert_eq!(view.turn_count, 0);
    assert_eq!(view.phase, Phase::Settled);
}

#[tokio::test]
async fn test_transport_failure_recovers() {
    let transport = Arc::new(ScriptedTransport::failing(AppError::Status {
        status: 401,
        message: "Authentication failed".to_string(),
    }));
    let handle = start(transport.clone(), 10);

    let outcome = handle.submit("hello?").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::TransportFailed);
    assert_eq!(handle.view().answer, TRANSPORT_FAILURE_MESSAGE);
    assert_eq!(handle.view().phase, Phase::Settled);
    assert!(!handle.is_busy());

    // Not stuck: the next submit goes through again.
    let outcome = handle.submit("hello again?").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::TransportFailed);
    assert_eq!(transport.calls(), 2);
    assert_eq!(
        handle.history().await.unwrap(),
        vec![
            ConversationMessage::user("hello?"),
            ConversationMessage::user("hello again?"),
        ]
    );
}

#[tokio::test]
async fn test_chunk_error_mid_stream_fails_turn() {
    let transport = Arc::new(ScriptedTransport {
        chunks: vec![
            Ok("partial ans".to_string()),
            Err(AppError::Transport("connection reset".to_string())),
            Ok("wer".to_string()),
        ],
        ..ScriptedTransport::new(&[])
    });
    let handle = start(transport, 10);

    let outcome = handle.submit("tell me").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::TransportFailed);
    assert_eq!(handle.view().answer, TRANSPORT_FAILURE_MESSAGE);
    assert_eq!(handle.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reentrant_submit_is_rejected() {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(ScriptedTransport {
        gate: Some(gate.clone()),
        ..ScriptedTransport::new(&["done"])
    });
    let handle = start(transport.clone(), 10);

    let first = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.submit("slow one").await })
    };

    timeout(Duration::from_secs(5), async {
        while transport.calls() == 0 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("transport was never called");

    assert!(handle.is_busy());
    assert_eq!(handle.view().phase, Phase::Streaming);
    assert!(matches!(handle.submit("impatient").await, Err(AppError::Busy)));

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Answered { .. }));
    assert_eq!(transport.calls(), 1);
    assert!(!handle.is_busy());
}

#[tokio::test]
async fn test_streamed_views_are_growing_prefixes() {
    let chunks: Vec<String> = "hey there, this is a *slow* answer"
        .split_inclusive(' ')
        .map(str::to_string)
        .collect();
    let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let transport = Arc::new(ScriptedTransport::new(&chunk_refs));
    let handle = start(transport, 10);

    let mut views = handle.subscribe();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if view.phase == Phase::Streaming {
                seen.push(view.answer);
            }
            if view.phase == Phase::Settled {
                break;
            }
        }
        seen
    });

    handle.submit("go slow").await.unwrap();
    let seen = collector.await.unwrap();

    let final_answer = handle.view().answer;
    let mut previous = String::new();
    for answer in seen {
        assert!(final_answer.starts_with(&answer));
        assert!(answer.starts_with(&previous), "stale view after newer one");
        previous = answer;
    }
}

#[tokio::test]
async fn test_suggestions_follow_turns() {
    let transport = Arc::new(ScriptedTransport::new(&["i wrote a blog about it"]));
    let handle = start(transport, 10);

    let initial = handle.view().suggestions;
    assert_eq!(initial, SuggestionEngine::default().initial().to_vec());

    handle.submit("anything written?").await.unwrap();
    assert_eq!(handle.view().suggestions[0], "what is ai dlc?");
}

#[tokio::test]
async fn test_shutdown_stops_actor() {
    let transport = Arc::new(ScriptedTransport::new(&["x"]));
    let handle = start(transport, 10);

    handle.shutdown().await.unwrap();
    sleep(Duration::from_millis(20)).await;

    assert!(matches!(handle.submit("still there?").await, Err(AppError::Actor(_))));
    assert!(!handle.is_busy());
}

#[tokio::test]
async fn test_submit_queued_behind_shutdown_releases_busy() {
    let transport = Arc::new(ScriptedTransport::new(&["x"]));
    let handle = start(transport.clone(), 10);

    handle.shutdown().await.unwrap();
    let first = handle.submit("hi there").await;

    assert!(matches!(first, Err(AppError::Actor(_))));
    assert!(!handle.is_busy());
    assert!(matches!(handle.submit("again").await, Err(AppError::Actor(_))));
    assert_eq!(transport.calls(), 0);
}

struct PanickingTransport;

#[async_trait]
impl ChatTransport for PanickingTransport {
    async fn stream_chat(
        &self,
        _messages: Vec<ConversationMessage>,
        _chunk_sender: mpsc::Sender<Result<String, AppError>>,
    ) -> Result<(), AppError> {
        panic!("transport blew up");
    }
}

#[tokio::test]
async fn test_runner_panic_releases_busy() {
    let handle = ChatSessionHandle::new_with_parts(
        Arc::new(PanickingTransport),
        PresetMatcher::empty(),
        SuggestionEngine::default(),
        &test_config(10),
    );

    let outcome = handle.submit("hello?").await;

    assert!(matches!(outcome, Err(AppError::Actor(_))));
    assert!(!handle.is_busy());
    assert!(matches!(handle.submit("still there?").await, Err(AppError::Actor(_))));
}
