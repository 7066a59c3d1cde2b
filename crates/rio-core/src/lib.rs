//! rio-core: study companion core for the Rio Branco diplomatic exam (CACD).
//!
//! Progress and XP model, telex sync codes, profile persistence, pomodoro and deep-focus
//! timers, syllabus reference data and the mentor client. The live voice session lives in
//! `rio-voice`.

mod config;
mod error;
mod mentor;
mod missions;
mod progress;
mod ranks;
mod session;
mod shared;
mod sound;
mod store;
pub mod prompts;
pub mod syllabus;
pub mod sync_code;
pub mod timer;

pub use config::{RioConfig, UserConfig, DEFAULT_LIVE_MODEL, DEFAULT_LIVE_URL, DEFAULT_VOICE};
pub use error::{RioError, RioResult};

// Progress model
pub use progress::{
    add_experience, level_progress, mean_accuracy, record_study_minutes, submission_xp, threshold,
    update_topic_progress, Progress, StudyStats, GOOD_SCORE_THRESHOLD, XP_BONUS_GOOD_SCORE,
    XP_FLASHCARDS, XP_PER_SUBMISSION, XP_THEORY,
};
pub use ranks::{rank_for, unlock_rewards, DiplomatRank, Reward, RewardCategory, DIPLOMAT_RANKS, REWARDS};
pub use missions::{
    advance_cycle, current_cycle_subject, daily_missions, days_until, schedule_context,
    set_study_cycle, weekly_plan, Mission,
};

// Shared types
pub use shared::{
    CorrectionResult, Dossier, DossierHighlight, DossierSource, Incidence, PracticeQuestion,
    SyllabusItem, TopicProgress, TopicUpdate, UserState,
};

// Session and persistence
pub use session::{ProgressUpdate, StudySession};
pub use store::{KeyValueStore, MemoryStore, ProfileStore, SledStore, CURRENT_USER_KEY, USER_KEY_PREFIX};

pub use sound::{Cue, CuePlayer, LogCuePlayer, RecordingCuePlayer, SoundCues};

// Mentor
pub use mentor::{
    clamp_score, extract_json, parse_correction, parse_dossier, parse_question, MentorBridge,
    MentorClient, EXPLAIN_FALLBACK, SCHEDULE_FALLBACK,
};
