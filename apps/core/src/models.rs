use serde::{Deserialize, Serialize};

use crate::markdown::Segment;

/// The author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Represents a single message within a chat session.
///
/// The history is append-only and owned by the session actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The text content of the message. Never carries the intensity marker.
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Lifecycle phase of the current submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Input accepted, deciding how to answer it.
    Checking,
    /// Revealing a canned answer.
    Preset,
    /// The request window is full; showing the fallback message.
    RateLimited,
    /// Reading the answer stream.
    Streaming,
    /// The turn is over; ready for the next input.
    Settled,
}

/// Everything a UI needs to draw the current state of a session.
///
/// Replaced wholesale on every accumulation tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatView {
    pub phase: Phase,
    /// Display text of the current answer (marker stripped).
    pub answer: String,
    /// `answer` tokenized for rendering.
    pub segments: Vec<Segment>,
    pub is_intense: bool,
    /// Completed assistant turns so far.
    pub turn_count: usize,
    pub suggestions: Vec<String>,
}

/// How a submission was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Ignored,
    /// Answered from the preset table without touching the network.
    Preset { answer: String },
    /// The request window was full; the fallback message is shown.
    RateLimited,
    /// The stream completed with a non-empty answer.
    Answered { text: String, is_intense: bool },
    /// The stream completed without any text.
    EmptyResponse,
    /// The transport failed; the local failure message is shown.
    TransportFailed,
}
