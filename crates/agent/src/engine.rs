//! Control engine
//!
//! Turn processing, in order:
//!
//! 1. A closed session answers with the closed response and is left as is.
//! 2. A session awaiting a slot whose intent or slot no longer exists in the
//!    dictionary is reset to idle.
//! 3. Unusable input gets the fallback and leaves the dialogue state alone.
//! 4. While awaiting a slot: an utterance matching a conversation-ending
//!    intent closes the session; otherwise a value for the slot fills it;
//!    otherwise another matching entry abandons the pending intent and is
//!    handled as if idle; otherwise the fallback is given, followed by the
//!    slot prompt when re-prompting is enabled.
//! 5. When idle: the best entry above the threshold answers. A
//!    slot-collecting intent is prefilled from the same utterance and then
//!    asks for its first missing slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use habla_config::{ControlConfig, IntentDefinition, SlotKind};
use habla_core::Utterance;
use habla_dictionary::{DictionaryEntry, DictionaryStore, MatchResult, Matcher};
use habla_text_processing::{Normalizer, SlotExtractor};
use serde::Serialize;

use crate::feedback::Feedback;
use crate::session::SessionRegistry;
use crate::state::{ConversationState, DialogueState, Turn, TurnKind};
use crate::template::render;
use crate::{AgentError, Result};

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    /// Dialogue state after the turn
    pub state: DialogueState,
    /// Intent the turn acted on
    pub intent: Option<String>,
    /// Match score (best rejected score when nothing matched)
    pub score: u32,
    pub kind: TurnKind,
    pub turn_count: u64,
}

/// Dialogue control engine
///
/// Shared across request handlers; all per-conversation state lives in the
/// session registry.
pub struct ControlEngine {
    normalizer: Normalizer,
    store: Arc<DictionaryStore>,
    matcher: Matcher,
    extractor: SlotExtractor,
    config: ControlConfig,
    sessions: Arc<SessionRegistry>,
}

/// Response, next state and bookkeeping decided for a turn
struct Step {
    response: String,
    state: DialogueState,
    intent: Option<String>,
    kind: TurnKind,
}

impl ControlEngine {
    pub fn new(
        normalizer: Normalizer,
        store: Arc<DictionaryStore>,
        matcher: Matcher,
        config: ControlConfig,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            config.max_sessions,
            Duration::from_secs(config.session_timeout_secs),
            Duration::from_secs(config.cleanup_interval_secs),
        ));
        Self::with_registry(normalizer, store, matcher, config, sessions)
    }

    pub fn with_registry(
        normalizer: Normalizer,
        store: Arc<DictionaryStore>,
        matcher: Matcher,
        config: ControlConfig,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            normalizer,
            store,
            matcher,
            extractor: SlotExtractor::new(),
            config,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<DictionaryStore> {
        &self.store
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Response text for one turn
    ///
    /// Never fails: when the session cannot be created the fallback response
    /// is returned.
    pub fn handle(&self, session_id: &str, text: &str) -> String {
        match self.handle_turn(session_id, text) {
            Ok(outcome) => outcome.response,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Turn rejected");
                self.config.fallback_response.clone()
            }
        }
    }

    /// Process one turn and report what happened
    ///
    /// Fails only when a new session would exceed the session limit.
    pub fn handle_turn(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let session = self.sessions.get_or_create(session_id)?;
        let mut state = session.lock();
        session.touch();

        if state.dialogue.is_closed() {
            tracing::debug!(session_id = %session_id, "Turn on closed session");
            return Ok(TurnOutcome {
                response: self.config.closed_response.clone(),
                state: DialogueState::Closed,
                intent: None,
                score: 0,
                kind: TurnKind::SessionClosed,
                turn_count: state.turn_count,
            });
        }

        self.repair_pending(session_id, &mut state);

        let (step, score) = match self.normalizer.normalize(text) {
            Ok(utterance) => {
                let result = self.matcher.find_best(&utterance, &self.store);
                let score = result.score;
                (self.advance(&mut state, &utterance, &result), score)
            }
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Invalid input");
                let step = Step {
                    response: self.fallback_for(&state.dialogue),
                    state: state.dialogue.clone(),
                    intent: None,
                    kind: TurnKind::InvalidInput,
                };
                (step, 0)
            }
        };

        state.dialogue = step.state.clone();
        if step.intent.is_some() {
            state.last_intent = step.intent.clone();
        }
        state.record(
            Turn {
                user: text.to_string(),
                response: step.response.clone(),
                intent: step.intent.clone(),
                kind: step.kind,
                at: Utc::now(),
            },
            self.config.history_turns,
        );

        tracing::info!(
            session_id = %session_id,
            kind = step.kind.as_str(),
            intent = ?step.intent,
            score,
            state = step.state.name(),
            "Turn processed"
        );

        Ok(TurnOutcome {
            response: step.response,
            state: step.state,
            intent: step.intent,
            score,
            kind: step.kind,
            turn_count: state.turn_count,
        })
    }

    /// Record the user's verdict on the latest response of a session
    pub fn record_feedback(
        &self,
        session_id: &str,
        satisfied: bool,
        comment: Option<String>,
    ) -> Result<Feedback> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
        let mut state = session.lock();
        session.touch();

        let last = state.history.back();
        let feedback = Feedback {
            satisfied,
            comment: comment.filter(|c| !c.trim().is_empty()),
            turn: state.turn_count,
            user: last.map(|t| t.user.clone()),
            response: last.map(|t| t.response.clone()),
            at: Utc::now(),
        };
        state
            .feedback
            .record(feedback.clone(), self.config.history_turns);

        if satisfied {
            tracing::info!(session_id = %session_id, turn = feedback.turn, "Positive feedback");
        } else {
            tracing::warn!(
                session_id = %session_id,
                turn = feedback.turn,
                comment = ?feedback.comment,
                "Negative feedback"
            );
        }

        Ok(feedback)
    }

    fn advance(
        &self,
        state: &mut ConversationState,
        utterance: &Utterance,
        result: &MatchResult,
    ) -> Step {
        match state.dialogue.clone() {
            DialogueState::AwaitingSlot { intent, slot } => {
                self.awaiting_slot(state, utterance, result, &intent, &slot)
            }
            DialogueState::Idle | DialogueState::Closed => self.idle(state, utterance, result),
        }
    }

    fn idle(
        &self,
        state: &mut ConversationState,
        utterance: &Utterance,
        result: &MatchResult,
    ) -> Step {
        let Some(entry) = result.entry.as_ref() else {
            return self.fallback_step(&DialogueState::Idle);
        };

        let Some(intent) = entry.intent.as_deref().and_then(|n| self.store.intent(n)) else {
            return Step {
                response: self.pick_response(entry, state),
                state: DialogueState::Idle,
                intent: None,
                kind: TurnKind::Matched,
            };
        };

        if intent.ends_conversation {
            return Step {
                response: self.pick_response(entry, state),
                state: DialogueState::Closed,
                intent: Some(intent.name.clone()),
                kind: TurnKind::Closed,
            };
        }

        if !intent.requires_slots() {
            return Step {
                response: self.pick_response(entry, state),
                state: DialogueState::Idle,
                intent: Some(intent.name.clone()),
                kind: TurnKind::Matched,
            };
        }

        state.slots.clear();
        for slot_name in &intent.required_slots {
            let Some(slot) = self.store.slot(slot_name) else {
                continue;
            };
            if slot.kind == SlotKind::Text {
                continue;
            }
            if let Some(value) = self.extractor.extract(slot, utterance) {
                state.slots.insert(slot_name.clone(), value);
            }
        }

        let lead = (!entry.responses.is_empty()).then(|| self.pick_response(entry, state));
        let mut step = self.next_slot_or_confirm(state, intent, TurnKind::SlotRequested);
        if step.kind == TurnKind::SlotFilled {
            step.kind = TurnKind::Matched;
        }
        if let Some(lead) = lead {
            step.response = format!("{} {}", lead, step.response);
        }
        step
    }

    fn awaiting_slot(
        &self,
        state: &mut ConversationState,
        utterance: &Utterance,
        result: &MatchResult,
        intent_name: &str,
        slot_name: &str,
    ) -> Step {
        if let Some(entry) = result.entry.as_ref() {
            let ends = entry
                .intent
                .as_deref()
                .and_then(|n| self.store.intent(n))
                .filter(|i| i.ends_conversation);
            if let Some(closing) = ends {
                state.slots.clear();
                return Step {
                    response: self.pick_response(entry, state),
                    state: DialogueState::Closed,
                    intent: Some(closing.name.clone()),
                    kind: TurnKind::Closed,
                };
            }
        }

        // Checked by repair_pending before every turn
        let (Some(intent), Some(slot)) = (self.store.intent(intent_name), self.store.slot(slot_name))
        else {
            state.reset_to_idle();
            return self.idle(state, utterance, result);
        };

        if let Some(value) = self.extractor.extract(slot, utterance) {
            state.slots.insert(slot_name.to_string(), value);
            return self.next_slot_or_confirm(state, intent, TurnKind::SlotFilled);
        }

        if result.is_match() {
            tracing::debug!(
                pending = %intent_name,
                slot = %slot_name,
                "Pending intent abandoned for a new match"
            );
            state.reset_to_idle();
            return self.idle(state, utterance, result);
        }

        self.fallback_step(&state.dialogue)
    }

    /// Ask for the first missing slot, or confirm when all are filled
    fn next_slot_or_confirm(
        &self,
        state: &mut ConversationState,
        intent: &IntentDefinition,
        prompt_kind: TurnKind,
    ) -> Step {
        let missing = intent
            .required_slots
            .iter()
            .find(|s| !state.slots.contains_key(*s));

        match missing {
            Some(slot_name) => {
                let prompt = self
                    .store
                    .slot(slot_name)
                    .map(|s| s.prompt.clone())
                    .unwrap_or_default();
                Step {
                    response: render(&prompt, &state.slots),
                    state: DialogueState::AwaitingSlot {
                        intent: intent.name.clone(),
                        slot: slot_name.clone(),
                    },
                    intent: Some(intent.name.clone()),
                    kind: prompt_kind,
                }
            }
            None => {
                let confirmation = intent.confirmation.as_deref().unwrap_or_default();
                let response = render(confirmation, &state.slots);
                let filled: HashMap<String, String> = std::mem::take(&mut state.slots);
                tracing::debug!(intent = %intent.name, slots = ?filled, "Intent fulfilled");
                Step {
                    response,
                    state: DialogueState::Idle,
                    intent: Some(intent.name.clone()),
                    kind: TurnKind::SlotFilled,
                }
            }
        }
    }

    /// Reset a pending slot that the dictionary no longer defines
    fn repair_pending(&self, session_id: &str, state: &mut ConversationState) {
        let DialogueState::AwaitingSlot { intent, slot } = &state.dialogue else {
            return;
        };

        let reason = match self.store.intent(intent) {
            None => Some(format!("unknown intent '{}'", intent)),
            Some(def) if !def.required_slots.contains(slot) => {
                Some(format!("slot '{}' is not required by '{}'", slot, intent))
            }
            Some(_) if self.store.slot(slot).is_none() => Some(format!("unknown slot '{}'", slot)),
            Some(_) => None,
        };

        if let Some(reason) = reason {
            let error = habla_core::Error::SessionStateCorruption {
                session_id: session_id.to_string(),
                reason,
            };
            tracing::warn!(error = %error, "Resetting session to idle");
            state.reset_to_idle();
        }
    }

    fn fallback_step(&self, current: &DialogueState) -> Step {
        Step {
            response: self.fallback_for(current),
            state: current.clone(),
            intent: None,
            kind: TurnKind::Fallback,
        }
    }

    fn fallback_for(&self, current: &DialogueState) -> String {
        if let DialogueState::AwaitingSlot { slot, .. } = current {
            if self.config.reprompt_on_fallback {
                if let Some(def) = self.store.slot(slot) {
                    return format!("{} {}", self.config.fallback_response, def.prompt);
                }
            }
        }
        self.config.fallback_response.clone()
    }

    /// Rotate through the entry's responses by turn number
    fn pick_response(&self, entry: &DictionaryEntry, state: &ConversationState) -> String {
        if entry.responses.is_empty() {
            return self.config.fallback_response.clone();
        }
        let idx = (state.turn_count % entry.responses.len() as u64) as usize;
        render(&entry.responses[idx], &state.slots)
    }
}

impl std::fmt::Debug for ControlEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlEngine")
            .field("normalizer", &self.normalizer)
            .field("entries", &self.store.len())
            .field("matcher", &self.matcher)
            .field("sessions", &self.sessions)
            .finish()
    }
}
