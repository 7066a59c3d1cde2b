//! Study session: the logged-in user's state and every mutation applied to it.
//!
//! Each mutation runs through the pure progress model, unlocks rewards, fires at most one
//! level-up cue, and is written through to the profile store before returning.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{RioError, RioResult};
use crate::missions;
use crate::progress::{self, Progress, StudyStats, XP_FLASHCARDS, XP_THEORY};
use crate::ranks::unlock_rewards;
use crate::shared::{TopicUpdate, UserState};
use crate::sound::{Cue, SoundCues};
use crate::store::ProfileStore;
use crate::sync_code;
use crate::syllabus::SYLLABUS;
use crate::timer::StudyCommit;

const MIN_USERNAME_LEN: usize = 3;

/// What a mutation did to the level counter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    pub levels_gained: u32,
    pub level: u32,
    pub xp: u32,
    /// Reward ids unlocked by this mutation.
    pub unlocked: Vec<&'static str>,
}

impl ProgressUpdate {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

pub struct StudySession {
    profiles: ProfileStore,
    cues: SoundCues,
    state: Option<UserState>,
}

impl StudySession {
    pub fn new(profiles: ProfileStore, cues: SoundCues) -> Self {
        Self {
            profiles,
            cues,
            state: None,
        }
    }

    pub fn cues(&self) -> &SoundCues {
        &self.cues
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn state(&self) -> Option<&UserState> {
        self.state.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.username.as_str())
    }

    fn active(&self) -> RioResult<&UserState> {
        self.state.as_ref().ok_or(RioError::NoActiveUser)
    }

    /// Logs in `username` (trimmed, at least three characters). A stored snapshot is
    /// overlaid on defaults; otherwise a fresh profile is created and saved.
    pub fn login(&mut self, username: &str) -> RioResult<&UserState> {
        let name = username.trim();
        if name.chars().count() < MIN_USERNAME_LEN {
            return Err(RioError::Validation(format!(
                "username must have at least {} characters",
                MIN_USERNAME_LEN
            )));
        }

        self.profiles.set_current_user(name);
        let mut state = self
            .profiles
            .load(name)
            .unwrap_or_else(|| UserState::new(name));
        state.username = name.to_string();
        progress::normalize_level(&mut state);
        self.profiles.save(name, &state);

        info!(username = %name, level = state.level, xp = state.xp, "logged in");
        Ok(self.state.insert(state))
    }

    /// Logs back in whoever the current-user pointer names.
    pub fn resume(&mut self) -> Option<&UserState> {
        let name = self.profiles.current_user()?;
        let outcome = self.login(&name).map(|_| ());
        if let Err(e) = outcome {
            warn!(username = %name, error = %e, "stored current user is not valid; ignoring");
            self.profiles.clear_current_user();
            return None;
        }
        self.state.as_ref()
    }

    /// Clears the pointer and the in-memory copy. The stored snapshot stays.
    pub fn logout(&mut self) {
        if let Some(state) = self.state.take() {
            info!(username = %state.username, "logged out");
        }
        self.profiles.clear_current_user();
    }

    fn apply(&mut self, progress: Progress) -> ProgressUpdate {
        let Progress {
            mut state,
            levels_gained,
        } = progress;
        let unlocked = unlock_rewards(&mut state);
        if levels_gained > 0 {
            self.cues.play(Cue::LevelUp);
            info!(username = %state.username, level = state.level, "level up");
        }
        self.profiles.save(&state.username, &state);
        let update = ProgressUpdate {
            levels_gained,
            level: state.level,
            xp: state.xp,
            unlocked,
        };
        self.state = Some(state);
        update
    }

    pub fn add_experience(&mut self, amount: i64) -> RioResult<ProgressUpdate> {
        let progress = progress::add_experience(self.active()?, amount);
        Ok(self.apply(progress))
    }

    /// Flips the theory checkbox. Turning it on grants 50 XP and stamps the study date.
    pub fn toggle_theory(&mut self, topic_id: &str) -> RioResult<ProgressUpdate> {
        let state = self.active()?;
        let enable = !state.topic(topic_id).theory;
        let mut update = TopicUpdate::default().theory(enable);
        if enable {
            update = update.studied_at(Utc::now());
        }
        let xp = if enable { i64::from(XP_THEORY) } else { 0 };
        let progress = progress::update_topic_progress(state, topic_id, &update, xp);
        Ok(self.apply(progress))
    }

    /// Flips the flashcards checkbox. Turning it on grants 30 XP and stamps the study date.
    pub fn toggle_flashcards(&mut self, topic_id: &str) -> RioResult<ProgressUpdate> {
        let state = self.active()?;
        let enable = !state.topic(topic_id).flashcards;
        let mut update = TopicUpdate::default().flashcards(enable);
        if enable {
            update = update.studied_at(Utc::now());
        }
        let xp = if enable { i64::from(XP_FLASHCARDS) } else { 0 };
        let progress = progress::update_topic_progress(state, topic_id, &update, xp);
        Ok(self.apply(progress))
    }

    fn set_numeric(&mut self, topic_id: &str, update: TopicUpdate) -> RioResult<ProgressUpdate> {
        let update = update.studied_at(Utc::now());
        let progress = progress::update_topic_progress(self.active()?, topic_id, &update, 0);
        Ok(self.apply(progress))
    }

    /// Negative input is stored as 0.
    pub fn set_questions_count(&mut self, topic_id: &str, count: i64) -> RioResult<ProgressUpdate> {
        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        self.set_numeric(topic_id, TopicUpdate::default().questions_count(count))
    }

    /// Clamped to 0–100.
    pub fn set_accuracy(&mut self, topic_id: &str, accuracy: f64) -> RioResult<ProgressUpdate> {
        let accuracy = if accuracy.is_finite() { accuracy } else { 0.0 };
        self.set_numeric(topic_id, TopicUpdate::default().accuracy(accuracy))
    }

    /// Overwrites the cumulative counter. Negative input is stored as 0.
    pub fn set_study_minutes(&mut self, topic_id: &str, minutes: i64) -> RioResult<ProgressUpdate> {
        let minutes = u32::try_from(minutes.max(0)).unwrap_or(u32::MAX);
        self.set_numeric(topic_id, TopicUpdate::default().study_minutes(minutes))
    }

    /// Adds a finished study block: minutes accumulate and half of them become XP.
    pub fn record_study_minutes(&mut self, topic_id: &str, minutes: u32) -> RioResult<ProgressUpdate> {
        let progress = progress::record_study_minutes(self.active()?, topic_id, minutes, Utc::now());
        Ok(self.apply(progress))
    }

    /// Credits a confirmed pomodoro work interval.
    pub fn commit_study(&mut self, commit: &StudyCommit) -> RioResult<ProgressUpdate> {
        self.record_study_minutes(&commit.topic_id, commit.minutes)
    }

    /// Counts a graded essay: 100 XP, plus 50 when the score is at least 7.0.
    pub fn record_submission(&mut self, score: Option<f64>) -> RioResult<ProgressUpdate> {
        let mut state = self.active()?.clone();
        state.submissions_count = state.submissions_count.saturating_add(1);
        let progress = progress::add_experience(&state, i64::from(progress::submission_xp(score)));
        Ok(self.apply(progress))
    }

    pub fn set_study_cycle(&mut self, subjects: Vec<String>) -> RioResult<()> {
        let mut state = self.active()?.clone();
        missions::set_study_cycle(&mut state, subjects);
        self.apply(Progress {
            state,
            levels_gained: 0,
        });
        Ok(())
    }

    pub fn advance_cycle(&mut self) -> RioResult<Option<String>> {
        let mut state = self.active()?.clone();
        missions::advance_cycle(&mut state);
        let subject = missions::current_cycle_subject(&state).map(str::to_string);
        self.apply(Progress {
            state,
            levels_gained: 0,
        });
        Ok(subject)
    }

    /// Replaces the local state with a decoded telex code. Nothing is written when the
    /// code does not decode or names an account that could not log in.
    pub fn apply_sync_code(&mut self, code: &str) -> RioResult<&UserState> {
        let mut state = sync_code::decode(code)?;
        state.username = state.username.trim().to_string();
        if state.username.chars().count() < MIN_USERNAME_LEN {
            return Err(RioError::Decode(format!(
                "telex username must have at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        self.profiles.set_current_user(&state.username);
        self.profiles.save(&state.username, &state);
        info!(username = %state.username, level = state.level, "telex applied");
        Ok(self.state.insert(state))
    }

    pub fn sync_code(&self) -> RioResult<String> {
        sync_code::encode(self.active()?)
    }

    pub fn export_backup(&self) -> RioResult<String> {
        sync_code::export_backup(self.active()?)
    }

    /// Restores a backup file into the logged-in account.
    pub fn import_backup(&mut self, text: &str) -> RioResult<&UserState> {
        let username = self.active()?.username.clone();
        let mut state = sync_code::import_backup(text)?;
        state.username = username;
        self.profiles.save(&state.username, &state);
        info!(username = %state.username, level = state.level, "backup restored");
        Ok(self.state.insert(state))
    }

    pub fn stats(&self) -> RioResult<StudyStats> {
        Ok(StudyStats::compute(self.active()?, SYLLABUS.len()))
    }
}
