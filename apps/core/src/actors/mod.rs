//! Chat session actor and its transport.

pub mod messages;
pub mod session;
pub mod traits;
pub mod transport;

pub use session::ChatSessionHandle;
pub use traits::ChatTransport;
pub use transport::HttpChatTransport;
