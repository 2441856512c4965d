//! HTTP router.

use crate::state::AppState;
use crate::ws;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Liveness summary served on `/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub connections: usize,
    pub provider_configured: bool,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::chat))
        .route("/ws/course", get(ws::course))
        .route("/ws/evaluation", get(ws::evaluation))
        .route("/ws/clear-memory", get(ws::clear_memory))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.orchestrator.store().session_count(),
        connections: state.connections.len(),
        provider_configured: state.provider_configured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::app_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use touchline_core::SessionId;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_counts() {
        let state = app_state(&[]);
        state
            .orchestrator
            .store()
            .append_user(&SessionId::from("s1"), "Bonjour");
        let _connection = state.connections.register(SessionId::from("s1"), "/ws");

        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 1);
        assert_eq!(json["connections"], 1);
        assert_eq!(json["provider_configured"], false);
    }

    #[tokio::test]
    async fn websocket_routes_require_upgrade() {
        for path in ["/ws", "/ws/course", "/ws/evaluation", "/ws/clear-memory"] {
            let response = router(app_state(&[]))
                .oneshot(Request::builder().uri(path).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert!(response.status().is_client_error(), "{path} accepted plain GET");
        }
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = router(app_state(&[]))
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
