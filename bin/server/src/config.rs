//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as separator, e.g. `GROQ__CHAT_MODEL` or
//! `CONVERSATION__CHUNK_DELAY_MS`.

use serde::Deserialize;
use std::time::Duration;
use touchline_ai::{DEFAULT_FALLBACK_MESSAGE, GroqConfig, OrchestratorConfig};
use touchline_conversation::StoreLimits;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Groq API key. The server starts without one; provider calls then fail.
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Provider endpoint and model overrides.
    #[serde(default)]
    pub groq: GroqConfig,

    /// Turn and memory settings.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Conversation-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Pause after each streamed fragment, in milliseconds.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    /// Whether to run the reachability probe before each provider call.
    #[serde(default)]
    pub probe_before_call: bool,

    /// Oldest turns are dropped past this count. Unset keeps everything.
    #[serde(default)]
    pub max_turns_per_session: Option<usize>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_chunk_delay_ms() -> u64 {
    30
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            chunk_delay_ms: default_chunk_delay_ms(),
            probe_before_call: false,
            max_turns_per_session: None,
        }
    }
}

impl ConversationConfig {
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            probe_before_call: self.probe_before_call,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_turns_per_session: self.max_turns_per_session,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present value cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder().add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Returns the provider config with the top-level API key applied.
    ///
    /// An explicit `GROQ__API_KEY` wins over `GROQ_API_KEY`.
    #[must_use]
    pub fn groq_config(&self) -> GroqConfig {
        let mut groq = self.groq.clone();
        if groq.api_key.is_none() {
            groq.api_key = self.groq_api_key.clone();
        }
        groq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(overrides: &[(&str, &str)]) -> ServerConfig {
        let mut builder = config::Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).expect("override");
        }
        ServerConfig::from_builder(builder).expect("config")
    }

    #[test]
    fn defaults_without_any_source() {
        let config = load(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert!(config.groq_api_key.is_none());
        assert!(!config.groq_config().is_configured());
        assert_eq!(config.conversation.chunk_delay_ms, 30);
        assert!(!config.conversation.probe_before_call);
        assert!(config.conversation.max_turns_per_session.is_none());
    }

    #[test]
    fn top_level_key_reaches_provider_config() {
        let config = load(&[("groq_api_key", "gsk_test")]);
        let groq = config.groq_config();
        assert!(groq.is_configured());
        assert_eq!(groq.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(groq.chat_model, "llama3-70b-8192");
    }

    #[test]
    fn nested_overrides_apply() {
        let config = load(&[
            ("groq.chat_model", "llama-3.3-70b-versatile"),
            ("conversation.chunk_delay_ms", "0"),
            ("conversation.probe_before_call", "true"),
            ("conversation.max_turns_per_session", "20"),
        ]);
        assert_eq!(config.groq.chat_model, "llama-3.3-70b-versatile");

        let orchestrator = config.conversation.orchestrator_config();
        assert!(orchestrator.chunk_delay.is_zero());
        assert!(orchestrator.probe_before_call);
        assert_eq!(config.conversation.store_limits().max_turns_per_session, Some(20));
    }
}
