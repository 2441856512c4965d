//! JSON frames exchanged over the WebSocket endpoints.

use crate::error::MessageError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use touchline_core::{Result, SessionId};

#[derive(Debug, Deserialize)]
struct RawClientMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio: Option<String>,
}

/// A message sent by a chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// A text utterance.
    Text(String),
    /// Decoded audio bytes, expected to be WAV.
    Audio(Vec<u8>),
}

impl ClientMessage {
    /// Parses a text frame. Audio takes precedence when both fields are set.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, bad base64, or a frame with
    /// neither `text` nor `audio`.
    pub fn parse(frame: &str) -> Result<Self, MessageError> {
        let raw: RawClientMessage =
            serde_json::from_str(frame).map_err(|e| MessageError::InvalidJson {
                reason: e.to_string(),
            })?;

        if let Some(audio) = raw.audio {
            let bytes = STANDARD
                .decode(audio.trim())
                .map_err(|e| MessageError::InvalidBase64 {
                    reason: e.to_string(),
                })?;
            return Ok(Self::Audio(bytes));
        }
        match raw.text {
            Some(text) => Ok(Self::Text(text)),
            None => Err(MessageError::Unprocessable.into()),
        }
    }
}

/// A request on the clear-memory endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ClearMemoryRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ClearMemoryRequest {
    /// Parses a frame. Malformed JSON counts as a request without an id.
    #[must_use]
    pub fn parse(frame: &str) -> Self {
        serde_json::from_str(frame).unwrap_or_default()
    }

    /// Returns the session to clear, if one was named.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(SessionId::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Connected,
    Success,
    Error,
}

/// A frame sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Sent once when a chat socket opens.
    Connected { status: Status, session_id: String },
    /// One reply fragment.
    Text { text: String },
    /// A synthesized reply, base64 encoded.
    Audio { audio: String },
    /// Ends the reply to one inbound message.
    Done { done: bool },
    /// A message could not be handled.
    Error { error: String },
    /// Answer on the clear-memory endpoint.
    Status { status: Status, message: String },
}

impl ServerMessage {
    #[must_use]
    pub fn connected(session_id: &SessionId) -> Self {
        Self::Connected {
            status: Status::Connected,
            session_id: session_id.to_string(),
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn audio(bytes: &[u8]) -> Self {
        Self::Audio {
            audio: STANDARD.encode(bytes),
        }
    }

    #[must_use]
    pub fn done() -> Self {
        Self::Done { done: true }
    }

    #[must_use]
    pub fn error(error: &MessageError) -> Self {
        Self::Error {
            error: error.client_message(),
        }
    }

    #[must_use]
    pub fn memory_cleared(session_id: &SessionId) -> Self {
        Self::Status {
            status: Status::Success,
            message: format!("Memory cleared for session {session_id}"),
        }
    }

    #[must_use]
    pub fn missing_session_id() -> Self {
        Self::Status {
            status: Status::Error,
            message: "No session_id provided".to_string(),
        }
    }

    /// Serializes the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
