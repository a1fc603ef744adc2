use crate::actors::messages::AppError;
use crate::models::ConversationMessage;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Defines the public interface for the chat backend.
///
/// This trait abstracts how the answer is produced, allowing the HTTP endpoint
/// to be swapped for scripted transports in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Sends the conversation and streams the answer text into `chunk_sender`
    /// in arrival order. Returns once the stream has ended.
    ///
    /// A failure before or during the stream is returned as `Err`, or sent as
    /// an `Err` item on `chunk_sender`.
    async fn stream_chat(
        &self,
        messages: Vec<ConversationMessage>,
        chunk_sender: mpsc::Sender<Result<String, AppError>>,
    ) -> Result<(), AppError>;
}
