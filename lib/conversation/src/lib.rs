//! Conversation memory for touchline.
//!
//! This crate provides:
//!
//! - **Turn**: one role-tagged utterance with its creation time
//! - **Session History**: the ordered turns of one session
//! - **Session Store**: the shared map from session id to history

pub mod history;
pub mod store;
pub mod turn;

pub use history::SessionHistory;
pub use store::{SessionHandle, SessionStore, StoreLimits};
pub use turn::{Role, Turn};
