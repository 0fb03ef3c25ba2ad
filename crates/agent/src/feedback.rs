//! User feedback on responses
//!
//! Each session keeps running counters plus the most recent feedback
//! entries. A feedback entry refers to the turn it was given after.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One verdict on a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub satisfied: bool,
    pub comment: Option<String>,
    /// Turn number the feedback refers to (0 before the first turn)
    pub turn: u64,
    /// User text of that turn, when still in history
    pub user: Option<String>,
    /// Response of that turn, when still in history
    pub response: Option<String>,
    pub at: DateTime<Utc>,
}

/// Feedback counters and recent entries of one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedbackLog {
    pub positive: u64,
    pub negative: u64,
    pub entries: VecDeque<Feedback>,
}

impl FeedbackLog {
    /// Count `feedback` and keep it among the last `limit` entries
    pub fn record(&mut self, feedback: Feedback, limit: usize) {
        if feedback.satisfied {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
        if limit == 0 {
            return;
        }
        while self.entries.len() >= limit {
            self.entries.pop_front();
        }
        self.entries.push_back(feedback);
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    pub fn summary(&self) -> FeedbackSummary {
        let mut summary = FeedbackSummary::default();
        summary.add(self);
        summary
    }
}

/// Aggregated feedback over one or more sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub total: u64,
    pub positive: u64,
    pub negative: u64,
    /// Percentage of positive feedback, 0 when none was given
    pub satisfaction_rate: f64,
    pub has_negative_feedback: bool,
    /// Negative entries that carry a comment
    pub negative_comments: Vec<Feedback>,
}

impl FeedbackSummary {
    pub fn add(&mut self, log: &FeedbackLog) {
        self.positive += log.positive;
        self.negative += log.negative;
        self.total = self.positive + self.negative;
        self.satisfaction_rate = if self.total == 0 {
            0.0
        } else {
            self.positive as f64 * 100.0 / self.total as f64
        };
        self.has_negative_feedback = self.negative > 0;
        self.negative_comments.extend(
            log.entries
                .iter()
                .filter(|f| !f.satisfied && f.comment.is_some())
                .cloned(),
        );
    }
}
