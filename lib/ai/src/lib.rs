//! Generation and speech for touchline.
//!
//! This crate provides:
//!
//! - **Backends**: traits for streaming generation, transcription and
//!   synthesis, with a Groq implementation of all three
//! - **Prompts**: the system prompt of each assistant persona
//! - **Probe**: a best-effort network reachability check
//! - **Orchestrator**: runs text and voice turns against a session store

pub mod audio;
pub mod backend;
pub mod error;
pub mod groq;
pub mod orchestrator;
pub mod probe;
pub mod prompt;

pub use audio::{ensure_wav, is_wav};
pub use backend::{
    ChatMessage, CompletionBackend, CompletionRequest, MessageRole, SpeechToText, TextToSpeech,
    TokenStream,
};
pub use error::{LlmError, SpeechError, VoiceError};
pub use groq::{GroqClient, GroqConfig};
pub use orchestrator::{
    DEFAULT_FALLBACK_MESSAGE, OrchestratorConfig, Providers, ReplyStream, TurnOrchestrator,
    VoiceReply,
};
pub use probe::{ProbeConfig, Reachability, ReachabilityProbe};
pub use prompt::{PromptKind, PromptTemplate};
