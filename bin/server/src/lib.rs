//! touchline WebSocket server.
//!
//! This crate wires the conversation store and the turn orchestrator to
//! the WebSocket endpoints served to fan clients.

pub mod config;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod ws;

#[cfg(test)]
mod test_support;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
