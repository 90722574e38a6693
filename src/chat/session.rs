//! Explicit per-session state: conversation plus selected model and options.

use super::message::{Conversation, Message};
use crate::config::resolve_model;
use crate::model::{ModelClient, QueryError, QueryOptions};
use crate::settings::AppSettings;

/// State the shell owns and hands to each query.
///
/// The query client never touches the conversation; this type records the
/// user turn, calls the client, then records the reply.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub conversation: Conversation,
    pub model: String,
    pub options: QueryOptions,
}

impl ChatSession {
    pub fn new(model: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            conversation: Conversation::new(),
            model: model.into(),
            options,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.model.clone(), settings.query_options())
    }

    /// Switch model; aliases such as `mistral` are expanded.
    pub fn set_model(&mut self, name: &str) -> &str {
        self.model = resolve_model(name);
        &self.model
    }

    /// Ask a question and record both turns.
    ///
    /// On failure the error's display text is recorded as the assistant turn,
    /// so turns keep alternating, and the error is returned for the caller to
    /// render as it sees fit.
    pub async fn ask(&mut self, client: &ModelClient, prompt: &str) -> Result<&Message, QueryError> {
        let prompt = prompt.trim();
        self.conversation.push_user(prompt);

        match client.query(prompt, &self.model, &self.options).await {
            Ok(reply) => Ok(self.conversation.push_assistant(reply)),
            Err(e) => {
                self.conversation.push_assistant(e.display_message());
                Err(e)
            }
        }
    }

    /// Start over with an empty conversation. Model and options are kept.
    pub fn reset(&mut self) {
        self.conversation.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_model_and_options() {
        let options = QueryOptions::default().with_max_retries(5);
        let mut session = ChatSession::new("google/gemma-7b-it", options.clone());
        session.conversation.push_user("hi");
        session.conversation.push_assistant("hello");

        session.reset();

        assert!(session.conversation.is_empty());
        assert_eq!(session.model, "google/gemma-7b-it");
        assert_eq!(session.options, options);
    }

    #[test]
    fn test_set_model_resolves_alias() {
        let mut session = ChatSession::from_settings(&AppSettings::default());
        assert_eq!(session.set_model("falcon"), "tiiuae/falcon-7b-instruct");
        assert_eq!(session.model, "tiiuae/falcon-7b-instruct");
    }
}
