//! Domain error types for WebSocket message handling.
//!
//! None of these close the connection: each is logged and answered with an
//! `{"error": ...}` frame, and the socket goes on to the next message.

use std::fmt;
use touchline_ai::VoiceError;

/// Errors raised while handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The frame is not valid JSON.
    InvalidJson { reason: String },
    /// The frame carries neither `text` nor `audio`.
    Unprocessable,
    /// The `audio` field is not valid base64.
    InvalidBase64 { reason: String },
    /// Audio was sent to an endpoint that only takes text.
    AudioNotSupported { endpoint: String },
    /// The voice turn failed.
    Voice { reason: String },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { reason } => write!(f, "invalid JSON: {reason}"),
            Self::Unprocessable => write!(f, "Unprocessable entity"),
            Self::InvalidBase64 { reason } => write!(f, "invalid base64 audio: {reason}"),
            Self::AudioNotSupported { endpoint } => {
                write!(f, "audio is not supported on {endpoint}")
            }
            Self::Voice { reason } => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for MessageError {}

impl MessageError {
    /// Returns the text sent back to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidJson { .. } => "Erreur de format JSON".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<&VoiceError> for MessageError {
    fn from(err: &VoiceError) -> Self {
        Self::Voice {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_uses_client_wording() {
        let err = MessageError::InvalidJson {
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(err.client_message(), "Erreur de format JSON");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn voice_errors_pass_through() {
        let err = MessageError::from(&VoiceError::InvalidAudio {
            header: b"OggS".to_vec(),
        });
        assert!(err.client_message().contains("not WAV"));
    }

    #[test]
    fn unprocessable_message() {
        assert_eq!(
            MessageError::Unprocessable.client_message(),
            "Unprocessable entity"
        );
    }
}
