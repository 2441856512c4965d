//! WebSocket conversation endpoints.
//!
//! Every chat socket gets its own session. Each inbound frame is answered
//! with a burst of frames ending in `{"done": true}`, or with a single
//! `{"error": ...}` frame when the message cannot be handled.

use crate::error::MessageError;
use crate::protocol::{ClearMemoryRequest, ClientMessage, ServerMessage};
use crate::state::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, future};
use touchline_ai::PromptKind;
use touchline_core::SessionId;
use tracing::{debug, error, info, instrument, warn};

/// A conversation endpoint and the persona it speaks as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Chat,
    Course,
    Evaluation,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Chat => "/ws",
            Self::Course => "/ws/course",
            Self::Evaluation => "/ws/evaluation",
        }
    }

    #[must_use]
    pub const fn prompt(self) -> PromptKind {
        match self {
            Self::Chat => PromptKind::Chat,
            Self::Course => PromptKind::Course,
            Self::Evaluation => PromptKind::Evaluation,
        }
    }

    /// Only the chat endpoint takes voice messages.
    #[must_use]
    pub const fn accepts_audio(self) -> bool {
        matches!(self, Self::Chat)
    }
}

pub async fn chat(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| converse(socket, state, Endpoint::Chat))
}

pub async fn course(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| converse(socket, state, Endpoint::Course))
}

pub async fn evaluation(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| converse(socket, state, Endpoint::Evaluation))
}

pub async fn clear_memory(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_clear_memory(socket, state))
}

#[instrument(skip(socket, state), fields(endpoint = endpoint.path()))]
async fn converse(mut socket: WebSocket, state: AppState, endpoint: Endpoint) {
    let session_id = state.orchestrator.store().get_or_create(None).id().clone();
    let connection = state.connections.register(session_id.clone(), endpoint.path());
    info!(session = %session_id, connection = %connection.id(), "websocket connected");

    if send(&mut socket, &ServerMessage::connected(&session_id))
        .await
        .is_err()
    {
        return;
    }

    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                warn!("binary frame rejected");
                if send(&mut socket, &ServerMessage::error(&MessageError::Unprocessable))
                    .await
                    .is_err()
                {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "websocket receive failed");
                break;
            }
        };

        let mut replies = respond(&state, endpoint, &session_id, frame.as_str());
        let mut delivered = true;
        while let Some(reply) = replies.next().await {
            if send(&mut socket, &reply).await.is_err() {
                delivered = false;
                break;
            }
        }
        if !delivered {
            break;
        }
    }

    info!(session = %session_id, "websocket closed");
}

/// Builds the frames answering one inbound message.
///
/// Text replies are streamed as they are generated. Failures end in a
/// single error frame and never close the socket.
#[must_use]
pub fn respond(
    state: &AppState,
    endpoint: Endpoint,
    session_id: &SessionId,
    frame: &str,
) -> BoxStream<'static, ServerMessage> {
    let message = match ClientMessage::parse(frame) {
        Ok(message) => message,
        Err(report) => {
            warn!(error = %report, "malformed client message");
            return stream::iter([ServerMessage::error(report.current_context())]).boxed();
        }
    };

    let template = endpoint.prompt().template();
    match message {
        ClientMessage::Text(text) => state
            .orchestrator
            .stream_reply(&template, text, Some(session_id.clone()))
            .map(ServerMessage::text)
            .chain(stream::once(future::ready(ServerMessage::done())))
            .boxed(),
        ClientMessage::Audio(_) if !endpoint.accepts_audio() => {
            let err = MessageError::AudioNotSupported {
                endpoint: endpoint.path().to_string(),
            };
            warn!(error = %err, "audio rejected");
            stream::iter([ServerMessage::error(&err)]).boxed()
        }
        ClientMessage::Audio(audio) => {
            let orchestrator = state.orchestrator.clone();
            let session_id = session_id.clone();
            stream::once(async move {
                match orchestrator
                    .voice_reply(&template, audio, Some(session_id))
                    .await
                {
                    Ok(reply) => vec![ServerMessage::audio(&reply.audio), ServerMessage::done()],
                    Err(report) => {
                        error!(error = %report, "voice turn failed");
                        vec![ServerMessage::error(&MessageError::from(
                            report.current_context(),
                        ))]
                    }
                }
            })
            .flat_map(stream::iter)
            .boxed()
        }
    }
}

#[instrument(skip(socket, state))]
async fn serve_clear_memory(mut socket: WebSocket, state: AppState) {
    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "websocket receive failed");
                break;
            }
        };

        let reply = clear_session(&state, frame.as_str());
        if send(&mut socket, &reply).await.is_err() {
            break;
        }
    }
    info!("memory clear websocket closed");
}

/// Clears the session named in a clear-memory frame.
#[must_use]
pub fn clear_session(state: &AppState, frame: &str) -> ServerMessage {
    match ClearMemoryRequest::parse(frame).session_id() {
        Some(session_id) => {
            state.orchestrator.store().clear(&session_id);
            info!(session = %session_id, "memory cleared");
            ServerMessage::memory_cleared(&session_id)
        }
        None => {
            warn!("clear-memory request without session_id");
            ServerMessage::missing_session_id()
        }
    }
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "failed to serialize server message");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}
