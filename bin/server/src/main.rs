use std::sync::Arc;
use touchline_ai::{GroqClient, Providers, ReachabilityProbe, TurnOrchestrator};
use touchline_conversation::SessionStore;
use touchline_server::{AppState, ServerConfig, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let groq = config.groq_config();
    let provider_configured = groq.is_configured();
    let providers = Providers::groq(GroqClient::new(groq), Arc::new(ReachabilityProbe::default()));

    let store = SessionStore::with_limits(config.conversation.store_limits());
    let orchestrator = TurnOrchestrator::new(store, providers)
        .with_config(config.conversation.orchestrator_config());
    let app = router(AppState::new(orchestrator, provider_configured));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
