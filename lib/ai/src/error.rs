//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `LlmError`: text generation provider failures
//! - `SpeechError`: transcription and synthesis provider failures
//! - `VoiceError`: failures of the voice turn as a whole

use std::fmt;

/// Errors from the text generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The provider has no credential configured.
    NotConfigured { provider: String },
    /// The provider could not be reached.
    Unreachable { provider: String, reason: String },
    /// The provider answered with a failure status.
    RequestFailed { status: Option<u16>, reason: String },
    /// A response or event could not be decoded.
    ResponseParseFailed { reason: String },
    /// The stream broke after it had started.
    StreamFailed { reason: String },
}

impl LlmError {
    /// Returns true for connectivity failures, where a fallback reply is
    /// more useful to the client than the raw error.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { provider } => {
                write!(f, "{provider} client is not initialized: API key is not set")
            }
            Self::Unreachable { provider, reason } => {
                write!(f, "{provider} is unreachable: {reason}")
            }
            Self::RequestFailed {
                status: Some(status),
                reason,
            } => write!(f, "request failed with status {status}: {reason}"),
            Self::RequestFailed {
                status: None,
                reason,
            } => write!(f, "request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse provider response: {reason}")
            }
            Self::StreamFailed { reason } => write!(f, "stream failed: {reason}"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from the speech-to-text and text-to-speech providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// The provider has no credential configured.
    NotConfigured { provider: String },
    /// The provider could not be reached.
    Unreachable { provider: String, reason: String },
    /// The provider answered with a failure status.
    RequestFailed { status: Option<u16>, reason: String },
    /// The response could not be decoded.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { provider } => {
                write!(f, "{provider} client is not initialized: API key is not set")
            }
            Self::Unreachable { provider, reason } => {
                write!(f, "{provider} is unreachable: {reason}")
            }
            Self::RequestFailed {
                status: Some(status),
                reason,
            } => write!(f, "speech request failed with status {status}: {reason}"),
            Self::RequestFailed {
                status: None,
                reason,
            } => write!(f, "speech request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse speech response: {reason}")
            }
        }
    }
}

impl std::error::Error for SpeechError {}

/// Errors from a voice turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// The payload is not a WAV container.
    InvalidAudio { header: Vec<u8> },
    /// Speech-to-text failed.
    Transcription { reason: String },
    /// Text-to-speech failed.
    Synthesis { reason: String },
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAudio { header } => {
                write!(f, "audio payload is not WAV (header: {header:?})")
            }
            Self::Transcription { reason } => write!(f, "transcription failed: {reason}"),
            Self::Synthesis { reason } => write!(f, "speech synthesis failed: {reason}"),
        }
    }
}

impl std::error::Error for VoiceError {}
