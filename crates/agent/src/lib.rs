//! Dialogue control for the habla engine
//!
//! The [`ControlEngine`] is the single entry point: it takes a session id and
//! raw user text and returns the response to send back. Internally it
//! normalizes the text, asks the matcher for the best dictionary entry and
//! advances the session's dialogue state:
//!
//! ```text
//!            match (no slots)              match (ends conversation)
//!   Idle ────────────────────▶ Idle   Idle ──────────────────────────▶ Closed
//!    │ ▲
//!    │ │ last slot filled
//!    ▼ │
//!   AwaitingSlot ──▶ AwaitingSlot (next slot)
//! ```
//!
//! Sessions live in a [`SessionRegistry`] and expire after a period of
//! inactivity.

pub mod engine;
pub mod feedback;
pub mod session;
pub mod state;
pub mod template;

pub use engine::{ControlEngine, TurnOutcome};
pub use feedback::{Feedback, FeedbackLog, FeedbackSummary};
pub use session::{FeedbackReport, Session, SessionRegistry, SessionSnapshot, SessionStats};
pub use state::{ConversationState, DialogueState, Turn, TurnKind};
pub use template::render;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Session limit reached ({0} sessions)")]
    SessionLimit(usize),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Core(#[from] habla_core::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
