//! Provider fakes for route and socket tests.

use crate::state::AppState;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use rootcause::Report;
use std::sync::Arc;
use std::time::Duration;
use touchline_ai::{
    CompletionBackend, CompletionRequest, LlmError, OrchestratorConfig, Providers, Reachability,
    SpeechError, SpeechToText, TextToSpeech, TokenStream, TurnOrchestrator,
};
use touchline_conversation::SessionStore;

struct CannedBackend {
    fragments: Vec<String>,
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn stream(&self, _request: &CompletionRequest) -> Result<TokenStream, Report<LlmError>> {
        let items: Vec<Result<String, Report<LlmError>>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(stream::iter(items).boxed())
    }

    fn default_model(&self) -> &str {
        "canned"
    }
}

struct EchoSpeech;

#[async_trait]
impl SpeechToText for EchoSpeech {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, Report<SpeechError>> {
        Ok("Bonjour".to_string())
    }
}

#[async_trait]
impl TextToSpeech for EchoSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Report<SpeechError>> {
        let mut audio = wav();
        audio.extend_from_slice(text.as_bytes());
        Ok(audio)
    }
}

struct Online;

#[async_trait]
impl Reachability for Online {
    async fn is_online(&self) -> bool {
        true
    }
}

/// A minimal WAV header.
pub fn wav() -> Vec<u8> {
    b"RIFF\0\0\0\0WAVE".to_vec()
}

/// State whose provider replies with the given fragments.
pub fn app_state(fragments: &[&str]) -> AppState {
    let speech = Arc::new(EchoSpeech);
    let providers = Providers {
        completion: Arc::new(CannedBackend {
            fragments: fragments.iter().map(ToString::to_string).collect(),
        }),
        speech_to_text: speech.clone(),
        text_to_speech: speech,
        probe: Arc::new(Online),
    };
    let orchestrator =
        TurnOrchestrator::new(SessionStore::new(), providers).with_config(OrchestratorConfig {
            chunk_delay: Duration::ZERO,
            ..OrchestratorConfig::default()
        });
    AppState::new(orchestrator, false)
}
