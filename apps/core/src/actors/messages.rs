use crate::models::{ConversationMessage, SubmitOutcome};
use tokio::sync::oneshot;

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the chat session actor.
#[derive(Debug)]
pub enum SessionMessage {
    /// A trimmed, non-empty user message to answer.
    Submit {
        content: String,
        /// A channel to send the resolved outcome back.
        responder: oneshot::Sender<SubmitOutcome>,
    },
    /// A request for a snapshot of the conversation history.
    History {
        responder: oneshot::Sender<Vec<ConversationMessage>>,
    },
    /// A command to stop the session actor.
    Shutdown,
}
