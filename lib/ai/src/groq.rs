//! Groq provider client.
//!
//! Implements streaming chat completions (OpenAI-compatible SSE),
//! Whisper transcription and PlayAI speech synthesis over HTTP.
//!
//! The client can be built without an API key so that the service starts
//! even when the credential is missing; every call then fails with
//! `NotConfigured` at the point of use.

use crate::backend::{CompletionBackend, CompletionRequest, SpeechToText, TextToSpeech, TokenStream};
use crate::error::{LlmError, SpeechError};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{StreamExt, future};
use reqwest::multipart::{Form, Part};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, instrument, warn};

const PROVIDER: &str = "groq";

/// SSE payload marking the end of a completion stream.
const STREAM_DONE: &str = "[DONE]";

/// Groq connection and model settings.
#[derive(Clone, Deserialize)]
pub struct GroqConfig {
    /// API key. Missing keys disable every provider call.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat completion model.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Speech-to-text model.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    /// Spoken language hint for transcription.
    #[serde(default = "default_stt_language")]
    pub stt_language: String,
    /// Text-to-speech model.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    /// Text-to-speech voice.
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_chat_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_top_p() -> f32 {
    1.0
}

fn default_stt_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_stt_language() -> String {
    "en".to_string()
}

fn default_tts_model() -> String {
    "playai-tts".to_string()
}

fn default_tts_voice() -> String {
    "Fritz-PlayAI".to_string()
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stt_model: default_stt_model(),
            stt_language: default_stt_language(),
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
        }
    }
}

impl GroqConfig {
    /// Returns the config with the given API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns true if an API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// Builds a completion request using the configured sampling settings.
    #[must_use]
    pub fn completion_request(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> CompletionRequest {
        CompletionRequest::new(self.chat_model.clone(), system, user)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_top_p(self.top_p)
    }
}

impl fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("stt_model", &self.stt_model)
            .field("stt_language", &self.stt_language)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .finish()
    }
}

/// HTTP client for the Groq API.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    config: GroqConfig,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    #[serde(flatten)]
    request: &'a CompletionRequest,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl GroqClient {
    /// Creates a client. Never fails; a missing key surfaces on first use.
    #[must_use]
    pub fn new(config: GroqConfig) -> Self {
        if !config.is_configured() {
            error!("GROQ_API_KEY is not set; provider calls will fail");
        }
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl CompletionBackend for GroqClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn stream(&self, request: &CompletionRequest) -> Result<TokenStream, Report<LlmError>> {
        let api_key = self.api_key().ok_or_else(|| LlmError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        let body = ChatCompletionBody {
            request,
            stream: true,
        };
        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(llm_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            error!(%status, %reason, "chat completion rejected");
            return Err(LlmError::RequestFailed {
                status: Some(status.as_u16()),
                reason,
            }
            .into());
        }

        debug!("chat completion stream opened");
        let tokens = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == STREAM_DONE))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => decode_chunk(&event.data),
                    Err(e) => Some(Err(LlmError::StreamFailed {
                        reason: e.to_string(),
                    }
                    .into())),
                })
            })
            .boxed();

        Ok(tokens)
    }

    fn default_model(&self) -> &str {
        &self.config.chat_model
    }

    fn completion_request(&self, system: &str, user: &str) -> CompletionRequest {
        self.config.completion_request(system, user)
    }
}

#[async_trait]
impl SpeechToText for GroqClient {
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, Report<SpeechError>> {
        let api_key = self.api_key().ok_or_else(|| SpeechError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechError::RequestFailed {
                status: None,
                reason: e.to_string(),
            })?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.stt_model.clone())
            .text("response_format", "json")
            .text("language", self.config.stt_language.clone())
            .text("temperature", "0.0");

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(speech_transport_error)?;
        let response = ensure_speech_success(response).await?;

        let body: TranscriptionResponse =
            response
                .json()
                .await
                .map_err(|e| SpeechError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;
        debug!(chars = body.text.len(), "transcription complete");
        Ok(body.text)
    }
}

#[async_trait]
impl TextToSpeech for GroqClient {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Report<SpeechError>> {
        let api_key = self.api_key().ok_or_else(|| SpeechError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        let body = SpeechBody {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
            response_format: "wav",
        };
        let response = self
            .http
            .post(self.endpoint("audio/speech"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(speech_transport_error)?;
        let response = ensure_speech_success(response).await?;

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::ResponseParseFailed {
                reason: e.to_string(),
            })?;
        debug!(bytes = audio.len(), "speech synthesis complete");
        Ok(audio.to_vec())
    }
}

/// Decodes one SSE data payload into a text fragment.
///
/// Returns `None` for chunks carrying no text (role headers, usage
/// trailers, keepalives).
fn decode_chunk(data: &str) -> Option<Result<String, Report<LlmError>>> {
    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(error = %e, data, "undecodable completion chunk");
            return Some(Err(LlmError::ResponseParseFailed {
                reason: e.to_string(),
            }
            .into()));
        }
    };

    if let Some(err) = chunk.error {
        let reason = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Some(Err(LlmError::StreamFailed { reason }.into()));
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(Ok)
}

fn llm_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_connect() || err.is_timeout() {
        LlmError::Unreachable {
            provider: PROVIDER.to_string(),
            reason: err.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}

fn speech_transport_error(err: reqwest::Error) -> SpeechError {
    if err.is_connect() || err.is_timeout() {
        SpeechError::Unreachable {
            provider: PROVIDER.to_string(),
            reason: err.to_string(),
        }
    } else {
        SpeechError::RequestFailed {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}

async fn ensure_speech_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, Report<SpeechError>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = response.text().await.unwrap_or_default();
    error!(%status, %reason, "speech request rejected");
    Err(SpeechError::RequestFailed {
        status: Some(status.as_u16()),
        reason,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_provider_models() {
        let config = GroqConfig::default();
        assert_eq!(config.chat_model, "llama3-70b-8192");
        assert_eq!(config.stt_model, "whisper-large-v3");
        assert_eq!(config.tts_voice, "Fritz-PlayAI");
        assert_eq!(config.max_tokens, 1024);
        assert!(!config.is_configured());
    }

    #[test]
    fn empty_api_key_is_not_configured() {
        let config = GroqConfig::default().with_api_key("");
        assert!(!config.is_configured());
        assert!(GroqConfig::default().with_api_key("gsk_x").is_configured());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GroqConfig::default().with_api_key("gsk_secret");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("gsk_secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn completion_request_uses_sampling_settings() {
        let request = GroqConfig::default().completion_request("sys", "hi");
        assert_eq!(request.model, "llama3-70b-8192");
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.top_p, Some(1.0));
    }

    #[test]
    fn body_flattens_request_and_sets_stream() {
        let request = CompletionRequest::new("m", "sys", "hi");
        let body = ChatCompletionBody {
            request: &request,
            stream: true,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["stream"], true);
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn decode_chunk_extracts_delta_content() {
        let data = r#"{"object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Allez"}}]}"#;
        let fragment = decode_chunk(data).expect("fragment").expect("ok");
        assert_eq!(fragment, "Allez");
    }

    #[test]
    fn decode_chunk_skips_empty_deltas() {
        let role_only = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert!(decode_chunk(role_only).is_none());

        let empty = r#"{"choices":[{"index":0,"delta":{"content":""}}]}"#;
        assert!(decode_chunk(empty).is_none());

        let no_choices = r#"{"choices":[],"x_groq":{"usage":{}}}"#;
        assert!(decode_chunk(no_choices).is_none());
    }

    #[test]
    fn decode_chunk_surfaces_api_errors() {
        let data = r#"{"error":{"message":"model overloaded"}}"#;
        let err = decode_chunk(data).expect("item").unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn decode_chunk_rejects_garbage() {
        assert!(decode_chunk("not json").expect("item").is_err());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_before_network() {
        let client = GroqClient::new(GroqConfig::default());
        let request = client.config().completion_request("sys", "hi");

        let err = client.stream(&request).await.err().expect("should fail");
        assert!(err.to_string().contains("not initialized"));

        let err = client.transcribe(vec![0; 16]).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));

        let err = client.synthesize("hello").await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = GroqConfig {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..GroqConfig::default()
        };
        let client = GroqClient::new(config);
        assert_eq!(
            client.endpoint("chat/completions"),
            "http://localhost:9000/v1/chat/completions"
        );
    }
}
