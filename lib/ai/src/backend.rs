//! Provider abstractions.
//!
//! The orchestrator talks to three external capabilities through these
//! traits: streaming text generation, speech-to-text and text-to-speech.

use crate::error::{LlmError, SpeechError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use rootcause::Report;
use serde::{Deserialize, Serialize};

/// Incremental text fragments produced by a generation provider.
pub type TokenStream = BoxStream<'static, Result<String, Report<LlmError>>>;

/// The role of a message sent to the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions framing the conversation.
    System,
    /// The user's utterance.
    User,
    /// A previous assistant reply.
    Assistant,
}

/// A role-tagged message sent to the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Messages, system instruction first.
    pub messages: Vec<ChatMessage>,
    /// Temperature for sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl CompletionRequest {
    /// Creates a request with a system instruction and a user utterance.
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets top-p.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Returns the system instruction, if any.
    #[must_use]
    pub fn system(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }

    /// Returns the last user utterance, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A text generation provider that streams its output.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Starts a completion and returns its fragments as they arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be started. Failures after
    /// the stream has started are yielded as stream items.
    async fn stream(&self, request: &CompletionRequest) -> Result<TokenStream, Report<LlmError>>;

    /// Returns the model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Builds a request for this backend from a system instruction and a
    /// user utterance.
    fn completion_request(&self, system: &str, user: &str) -> CompletionRequest {
        CompletionRequest::new(self.default_model(), system, user)
    }
}

/// Speech-to-text provider.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes a WAV payload to text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, Report<SpeechError>>;
}

/// Text-to-speech provider.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesizes text to an audio payload.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Report<SpeechError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_builder() {
        let request = CompletionRequest::new("llama3-70b-8192", "Be nice.", "Hello")
            .with_temperature(0.5)
            .with_max_tokens(1024)
            .with_top_p(1.0);

        assert_eq!(request.system(), Some("Be nice."));
        assert_eq!(request.user(), Some("Hello"));
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.max_tokens, Some(1024));
    }

    #[test]
    fn completion_request_wire_shape() {
        let request = CompletionRequest::new("m", "sys", "hi");
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json.get("temperature").is_none());
    }
}
