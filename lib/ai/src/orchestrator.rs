//! Turn orchestration.
//!
//! A turn reads the session transcript, renders it into the persona's
//! system prompt, streams the provider's reply back fragment by fragment
//! and records the exchange once the reply has completed.
//!
//! Provider failures never escape as errors on the text path. A provider
//! that cannot be reached yields the fallback message; any other failure
//! yields a single `Error: ...` fragment. In both cases the assistant turn
//! is not recorded.

use crate::audio::ensure_wav;
use crate::backend::{CompletionBackend, SpeechToText, TextToSpeech, TokenStream};
use crate::error::{LlmError, VoiceError};
use crate::groq::GroqClient;
use crate::probe::Reachability;
use crate::prompt::PromptTemplate;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use rootcause::Report;
use std::sync::Arc;
use std::time::Duration;
use touchline_conversation::SessionStore;
use touchline_core::SessionId;
use tracing::{debug, error, info, instrument, warn};

/// Reply sent when the provider cannot be reached.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Je ne suis pas en mesure de répondre en mode hors ligne pour le moment.";

/// Reply fragments, in provider order.
pub type ReplyStream = BoxStream<'static, String>;

/// Tuning for [`TurnOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause after each relayed fragment.
    pub chunk_delay: Duration,
    /// Consult the reachability probe before calling the provider.
    pub probe_before_call: bool,
    pub fallback_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chunk_delay: Duration::from_millis(30),
            probe_before_call: false,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// The external capabilities a turn depends on.
#[derive(Clone)]
pub struct Providers {
    pub completion: Arc<dyn CompletionBackend>,
    pub speech_to_text: Arc<dyn SpeechToText>,
    pub text_to_speech: Arc<dyn TextToSpeech>,
    pub probe: Arc<dyn Reachability>,
}

impl Providers {
    /// Uses one Groq client for generation, transcription and synthesis.
    #[must_use]
    pub fn groq(client: GroqClient, probe: Arc<dyn Reachability>) -> Self {
        let client = Arc::new(client);
        Self {
            completion: client.clone(),
            speech_to_text: client.clone(),
            text_to_speech: client,
            probe,
        }
    }
}

/// Result of a voice turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceReply {
    /// What the user said.
    pub transcript: String,
    /// The assistant's reply text.
    pub reply: String,
    /// The reply as synthesized audio.
    pub audio: Vec<u8>,
}

/// Runs conversation turns against the session store and the providers.
#[derive(Clone)]
pub struct TurnOrchestrator {
    store: SessionStore,
    providers: Providers,
    config: Arc<OrchestratorConfig>,
}

impl TurnOrchestrator {
    #[must_use]
    pub fn new(store: SessionStore, providers: Providers) -> Self {
        Self {
            store,
            providers,
            config: Arc::new(OrchestratorConfig::default()),
        }
    }

    /// Sets the orchestrator configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns true if the probe currently considers the network reachable.
    pub async fn is_online(&self) -> bool {
        self.providers.probe.is_online().await
    }

    /// Streams the reply to one text utterance.
    ///
    /// Nothing happens until the stream is first polled. With no session
    /// the turn is stateless: history is empty and nothing is recorded.
    #[must_use]
    pub fn stream_reply(
        &self,
        template: &PromptTemplate,
        utterance: impl Into<String>,
        session: Option<SessionId>,
    ) -> ReplyStream {
        let start = ReplyState::Start {
            orchestrator: self.clone(),
            template: template.clone(),
            utterance: utterance.into(),
            session,
        };
        stream::unfold(start, ReplyState::advance).boxed()
    }

    /// Runs a voice turn: transcribe, reply, synthesize.
    ///
    /// The reply text goes through [`stream_reply`](Self::stream_reply), so
    /// the transcript and reply are recorded exactly as for a text turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not WAV or if transcription or
    /// synthesis fails.
    #[instrument(skip(self, template, audio), fields(template = %template.name, bytes = audio.len()))]
    pub async fn voice_reply(
        &self,
        template: &PromptTemplate,
        audio: Vec<u8>,
        session: Option<SessionId>,
    ) -> Result<VoiceReply, Report<VoiceError>> {
        ensure_wav(&audio)?;

        let transcript = self
            .providers
            .speech_to_text
            .transcribe(audio)
            .await
            .map_err(|report| VoiceError::Transcription {
                reason: report.current_context().to_string(),
            })?;
        info!(chars = transcript.len(), "audio transcribed");

        let reply = self
            .stream_reply(template, transcript.clone(), session)
            .collect::<Vec<_>>()
            .await
            .concat();

        let audio = self
            .providers
            .text_to_speech
            .synthesize(&reply)
            .await
            .map_err(|report| VoiceError::Synthesis {
                reason: report.current_context().to_string(),
            })?;
        debug!(bytes = audio.len(), "reply synthesized");

        Ok(VoiceReply {
            transcript,
            reply,
            audio,
        })
    }

    fn record_user(&self, session: Option<&SessionId>, utterance: &str) {
        if let Some(id) = session {
            self.store.append_user(id, utterance);
        }
    }

    fn failure_fragment(&self, err: &LlmError) -> String {
        if err.is_unreachable() {
            self.config.fallback_message.clone()
        } else {
            format!("Error: {err}")
        }
    }
}

enum ReplyState {
    Start {
        orchestrator: TurnOrchestrator,
        template: PromptTemplate,
        utterance: String,
        session: Option<SessionId>,
    },
    Relaying {
        orchestrator: TurnOrchestrator,
        tokens: TokenStream,
        reply: String,
        session: Option<SessionId>,
    },
    Finished,
}

impl ReplyState {
    async fn advance(self) -> Option<(String, Self)> {
        match self {
            Self::Start {
                orchestrator,
                template,
                utterance,
                session,
            } => Self::start(orchestrator, &template, utterance, session).await,
            Self::Relaying {
                orchestrator,
                tokens,
                reply,
                session,
            } => Self::relay(orchestrator, tokens, reply, session).await,
            Self::Finished => None,
        }
    }

    async fn start(
        orchestrator: TurnOrchestrator,
        template: &PromptTemplate,
        utterance: String,
        session: Option<SessionId>,
    ) -> Option<(String, Self)> {
        // History is read before this turn's utterance is recorded.
        let history = session
            .as_ref()
            .map(|id| orchestrator.store.render(id))
            .unwrap_or_default();
        let system = template.render(&history, "");

        if orchestrator.config.probe_before_call && !orchestrator.is_online().await {
            warn!(template = %template.name, "provider presumed offline, sending fallback");
            return Some((orchestrator.config.fallback_message.clone(), Self::Finished));
        }

        let backend = orchestrator.providers.completion.clone();
        let request = backend.completion_request(&system, &utterance);
        match backend.stream(&request).await {
            Ok(tokens) => {
                debug!(template = %template.name, "completion stream opened");
                orchestrator.record_user(session.as_ref(), &utterance);
                Self::relay(orchestrator, tokens, String::new(), session).await
            }
            Err(report) => {
                error!(template = %template.name, error = %report, "completion request failed");
                let fragment = orchestrator.failure_fragment(report.current_context());
                Some((fragment, Self::Finished))
            }
        }
    }

    async fn relay(
        orchestrator: TurnOrchestrator,
        mut tokens: TokenStream,
        mut reply: String,
        session: Option<SessionId>,
    ) -> Option<(String, Self)> {
        while let Some(item) = tokens.next().await {
            match item {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    let delay = orchestrator.config.chunk_delay;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    reply.push_str(&fragment);
                    return Some((
                        fragment,
                        Self::Relaying {
                            orchestrator,
                            tokens,
                            reply,
                            session,
                        },
                    ));
                }
                Err(report) => {
                    error!(error = %report, "completion stream broke");
                    let fragment = format!("Error: {}", report.current_context());
                    return Some((fragment, Self::Finished));
                }
            }
        }

        if let Some(id) = &session
            && !reply.is_empty()
        {
            orchestrator.store.append_assistant(id, reply);
        }
        None
    }
}
