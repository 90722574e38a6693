//! Conversation state owned by the presentation shell.

mod message;
mod session;

pub use message::{Conversation, Message, Role};
pub use session::ChatSession;
