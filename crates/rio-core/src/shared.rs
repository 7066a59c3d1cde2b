//! Shared types used across the rio crates.
//!
//! Every persisted or wire type serialises with camelCase field names so snapshots stay
//! compatible with the telex codes and backup files produced by the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// -----------------------------------------------------------------------------
// User state
// -----------------------------------------------------------------------------

/// Study metrics for one syllabus topic. Created lazily on first update and merged,
/// never replaced, afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicProgress {
    pub theory: bool,
    pub questions_count: u32,
    /// Percent of correct answers, 0–100.
    pub accuracy: f64,
    pub flashcards: bool,
    /// Cumulative minutes committed from the timers or typed in.
    pub study_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<DateTime<Utc>>,
}

impl TopicProgress {
    /// Merges the fields set in `update` into this record.
    pub fn merge(&mut self, update: &TopicUpdate) {
        if let Some(theory) = update.theory {
            self.theory = theory;
        }
        if let Some(count) = update.questions_count {
            self.questions_count = count;
        }
        if let Some(accuracy) = update.accuracy {
            self.accuracy = accuracy.clamp(0.0, 100.0);
        }
        if let Some(flashcards) = update.flashcards {
            self.flashcards = flashcards;
        }
        if let Some(minutes) = update.study_minutes {
            self.study_minutes = minutes;
        }
        if let Some(date) = update.last_study_date {
            self.last_study_date = Some(date);
        }
    }
}

/// Partial update for a [`TopicProgress`]. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicUpdate {
    pub theory: Option<bool>,
    pub questions_count: Option<u32>,
    pub accuracy: Option<f64>,
    pub flashcards: Option<bool>,
    pub study_minutes: Option<u32>,
    pub last_study_date: Option<DateTime<Utc>>,
}

impl TopicUpdate {
    pub fn theory(mut self, value: bool) -> Self {
        self.theory = Some(value);
        self
    }

    pub fn flashcards(mut self, value: bool) -> Self {
        self.flashcards = Some(value);
        self
    }

    pub fn questions_count(mut self, value: u32) -> Self {
        self.questions_count = Some(value);
        self
    }

    pub fn accuracy(mut self, value: f64) -> Self {
        self.accuracy = Some(value);
        self
    }

    pub fn study_minutes(mut self, value: u32) -> Self {
        self.study_minutes = Some(value);
        self
    }

    pub fn studied_at(mut self, when: DateTime<Utc>) -> Self {
        self.last_study_date = Some(when);
        self
    }
}

/// Full per-user snapshot. Persisted after every mutation, exported as telex code or backup.
///
/// At rest `xp < level * 200`: excess experience is folded into level-ups immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserState {
    pub username: String,
    pub xp: u32,
    pub level: u32,
    pub submissions_count: u32,
    pub unlocked_reward_ids: BTreeSet<String>,
    pub edital_progress: BTreeMap<String, TopicProgress>,
    pub study_cycle: Vec<String>,
    pub current_cycle_index: usize,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            username: String::new(),
            xp: 0,
            level: 1,
            submissions_count: 0,
            unlocked_reward_ids: BTreeSet::new(),
            edital_progress: BTreeMap::new(),
            study_cycle: Vec::new(),
            current_cycle_index: 0,
        }
    }
}

impl UserState {
    /// Fresh state for a first login.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Progress for `topic_id`, or the default record when the topic was never touched.
    pub fn topic(&self, topic_id: &str) -> TopicProgress {
        self.edital_progress
            .get(topic_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Serializes to JSON bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserializes from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

// -----------------------------------------------------------------------------
// Syllabus reference data
// -----------------------------------------------------------------------------

/// How often a syllabus item shows up in past exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Incidence {
    Alta,
    #[serde(rename = "Média")]
    Media,
    Baixa,
}

impl Incidence {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alta => "Alta",
            Self::Media => "Média",
            Self::Baixa => "Baixa",
        }
    }
}

/// One line of the exam syllabus (edital). Static, read-only at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyllabusItem {
    pub id: &'static str,
    pub subject: &'static str,
    pub topic: &'static str,
    pub subtopic: &'static str,
    pub description: &'static str,
    pub incidence: Incidence,
}

// -----------------------------------------------------------------------------
// Writing practice
// -----------------------------------------------------------------------------

/// A discursive question, generated by the mentor or typed in by the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PracticeQuestion {
    pub subject: String,
    pub topic: String,
    /// The prompt text.
    pub command: String,
    /// Expected answer length, in lines.
    pub lines: u32,
}

impl Default for PracticeQuestion {
    fn default() -> Self {
        Self {
            subject: String::new(),
            topic: String::new(),
            command: String::new(),
            lines: 60,
        }
    }
}

/// Graded essay. Transient, one per submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrectionResult {
    /// 0.00–10.00, two decimals.
    pub score: f64,
    pub justification: String,
    pub errors: Vec<String>,
    pub omissions: Vec<String>,
    pub highlights: Vec<String>,
    pub bank_grade: f64,
    pub approved_grade: f64,
    pub model_response: String,
    pub improvement_plan: Vec<String>,
}

// -----------------------------------------------------------------------------
// Weekly dossier
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DossierHighlight {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DossierHighlight {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DossierSource {
    pub title: String,
    pub uri: String,
}

/// Periodic foreign-policy digest shown on the home screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dossier {
    pub current: String,
    pub previous: String,
    pub highlights: Vec<DossierHighlight>,
    pub sources: Vec<DossierSource>,
}

impl Dossier {
    /// Headlines shown when the digest cannot be fetched.
    pub fn fallback() -> Self {
        Self {
            highlights: vec![
                DossierHighlight::new("Brasil reafirma protagonismo em temas ambientais no G20"),
                DossierHighlight::new("Itamaraty monitora desdobramentos de crises regionais"),
                DossierHighlight::new("Novos acordos de cooperação técnica com países africanos"),
            ],
            ..Default::default()
        }
    }
}
