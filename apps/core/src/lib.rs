// ZenChat Core
// Client-side streaming pipeline: request gating, answer accumulation,
// markdown rendering and persona signals.

pub mod actors;
pub mod brain;
pub mod config;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod models;
pub mod rate_limiter;
pub mod stream;

#[cfg(test)]
mod tests;

pub use actors::{ChatSessionHandle, ChatTransport, HttpChatTransport};
pub use config::ChatConfig;
pub use error::AppError;
pub use markdown::{tokenize, LinkTarget, Segment, SegmentKind};
pub use models::{ChatRole, ChatView, ConversationMessage, Phase, SubmitOutcome};
