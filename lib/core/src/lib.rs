//! Core types shared by the touchline crates.
//!
//! This crate provides the identifiers used to key sessions, turns and
//! connections, plus the `Result` alias every crate reports errors through.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConnectionId, ParseIdError, SessionId, TurnId};
