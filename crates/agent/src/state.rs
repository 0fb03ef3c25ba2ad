//! Per-session dialogue state

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackLog;

/// Where a conversation stands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    /// Waiting for the user to supply `slot` of `intent`
    AwaitingSlot { intent: String, slot: String },
    /// Terminal: every further turn gets the closed response
    Closed,
}

impl DialogueState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingSlot { .. } => "awaiting_slot",
            Self::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// What a turn did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// An entry matched and its response was given
    Matched,
    /// A pending slot was filled
    SlotFilled,
    /// A slot-collecting intent started and asked for its first slot
    SlotRequested,
    /// Nothing matched
    Fallback,
    /// The input was unusable
    InvalidInput,
    /// The turn closed the conversation
    Closed,
    /// The conversation was already closed
    SessionClosed,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::SlotFilled => "slot_filled",
            Self::SlotRequested => "slot_requested",
            Self::Fallback => "fallback",
            Self::InvalidInput => "invalid_input",
            Self::Closed => "closed",
            Self::SessionClosed => "session_closed",
        }
    }
}

/// One exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub response: String,
    pub intent: Option<String>,
    pub kind: TurnKind,
    pub at: DateTime<Utc>,
}

/// Mutable state of one conversation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    pub dialogue: DialogueState,
    /// Values collected for the pending intent
    pub slots: HashMap<String, String>,
    pub last_intent: Option<String>,
    /// Turns processed, including rejected input
    pub turn_count: u64,
    pub history: VecDeque<Turn>,
    pub feedback: FeedbackLog,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, keeping at most `limit` turns
    pub fn record(&mut self, turn: Turn, limit: usize) {
        self.turn_count += 1;
        if limit == 0 {
            return;
        }
        while self.history.len() >= limit {
            self.history.pop_front();
        }
        self.history.push_back(turn);
    }

    /// Drop any pending intent and its collected slots
    pub fn reset_to_idle(&mut self) {
        self.dialogue = DialogueState::Idle;
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(user: &str) -> Turn {
        Turn {
            user: user.to_string(),
            response: "ok".to_string(),
            intent: None,
            kind: TurnKind::Matched,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = ConversationState::new();
        for i in 0..5 {
            state.record(turn(&i.to_string()), 3);
        }
        assert_eq!(state.turn_count, 5);
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history.front().unwrap().user, "2");
    }

    #[test]
    fn test_zero_history_still_counts() {
        let mut state = ConversationState::new();
        state.record(turn("a"), 0);
        assert_eq!(state.turn_count, 1);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_dialogue_state_serialization() {
        let json = serde_json::to_value(DialogueState::AwaitingSlot {
            intent: "reservar".into(),
            slot: "fecha".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "awaiting_slot");
        assert_eq!(json["slot"], "fecha");

        let idle = serde_json::to_value(DialogueState::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }

    #[test]
    fn test_reset() {
        let mut state = ConversationState::new();
        state.dialogue = DialogueState::AwaitingSlot {
            intent: "a".into(),
            slot: "b".into(),
        };
        state.slots.insert("x".into(), "y".into());
        state.reset_to_idle();
        assert_eq!(state.dialogue, DialogueState::Idle);
        assert!(state.slots.is_empty());
    }
}
