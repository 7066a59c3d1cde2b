//! Per-turn transcript accumulation.
//!
//! Deltas for both sides pile up until the remote signals the end of a turn; the flush
//! yields one entry per non-empty side, user first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct TranscriptBuffer {
    user: String,
    model: String,
}

impl TranscriptBuffer {
    pub fn push_input(&mut self, delta: &str) {
        self.user.push_str(delta);
    }

    pub fn push_output(&mut self, delta: &str) {
        self.model.push_str(delta);
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.model.is_empty()
    }

    /// Ends the turn and clears both sides.
    pub fn flush(&mut self) -> Vec<TranscriptEntry> {
        let timestamp = Utc::now();
        let user = std::mem::take(&mut self.user);
        let model = std::mem::take(&mut self.model);
        [(Role::User, user), (Role::Model, model)]
            .into_iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(role, text)| TranscriptEntry {
                role,
                text,
                timestamp,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_orders_user_then_model() {
        let mut buffer = TranscriptBuffer::default();
        buffer.push_output("Bonjour, ");
        buffer.push_input("Bom dia");
        buffer.push_output("monsieur.");
        let entries = buffer.flush();
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].role, entries[0].text.as_str()), (Role::User, "Bom dia"));
        assert_eq!((entries[1].role, entries[1].text.as_str()), (Role::Model, "Bonjour, monsieur."));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_sides_are_skipped() {
        let mut buffer = TranscriptBuffer::default();
        assert!(buffer.flush().is_empty());
        buffer.push_output("Olá");
        let entries = buffer.flush();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, Role::Model);
    }
}
