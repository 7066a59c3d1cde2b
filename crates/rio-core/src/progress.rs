//! Progress/XP model: level curve, per-topic merges and the aggregate read model.
//!
//! Everything here is pure. Side effects (sound cues, persistence) belong to the
//! session controller that calls into these functions.

use chrono::{DateTime, Utc};

use crate::shared::{TopicUpdate, UserState};

/// XP granted per graded essay.
pub const XP_PER_SUBMISSION: u32 = 100;
/// Extra XP when the essay scores at least [`GOOD_SCORE_THRESHOLD`].
pub const XP_BONUS_GOOD_SCORE: u32 = 50;
pub const GOOD_SCORE_THRESHOLD: f64 = 7.0;
/// XP for marking a topic's theory as read.
pub const XP_THEORY: u32 = 50;
/// XP for marking a topic's flashcards as done.
pub const XP_FLASHCARDS: u32 = 30;

/// XP needed to leave `level`.
#[inline]
pub fn threshold(level: u32) -> u32 {
    level.saturating_mul(200)
}

/// New state plus how many levels the change crossed.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub state: UserState,
    pub levels_gained: u32,
}

impl Progress {
    /// True when at least one level-up happened. Callers fire a single notification
    /// regardless of how many levels were crossed.
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Adds `amount` XP, folding the excess into level-ups. Amounts ≤ 0 are no-ops.
pub fn add_experience(state: &UserState, amount: i64) -> Progress {
    let mut next = state.clone();
    if amount <= 0 {
        return Progress {
            state: next,
            levels_gained: 0,
        };
    }
    let gained = u32::try_from(amount).unwrap_or(u32::MAX);
    next.xp = next.xp.saturating_add(gained);
    let levels_gained = normalize_level(&mut next);
    Progress {
        state: next,
        levels_gained,
    }
}

/// Folds `xp ≥ threshold(level)` into level-ups until the invariant holds again.
/// One gain can span several levels, hence the loop. At the level ceiling the leftover
/// xp is capped just below the threshold.
pub(crate) fn normalize_level(state: &mut UserState) -> u32 {
    match fold_levels(state) {
        Ok(gained) => gained,
        Err(gained) => {
            state.xp = threshold(state.level).saturating_sub(1);
            gained
        }
    }
}

/// Like [`normalize_level`] but reports hitting the level ceiling as `None`, leaving
/// `state` partially folded.
pub(crate) fn try_normalize_level(state: &mut UserState) -> Option<u32> {
    fold_levels(state).ok()
}

/// `Err` carries the levels gained before the ceiling was reached.
fn fold_levels(state: &mut UserState) -> Result<u32, u32> {
    if state.level == 0 {
        state.level = 1;
    }
    let mut gained: u32 = 0;
    while state.xp >= threshold(state.level) {
        let Some(next) = state.level.checked_add(1) else {
            return Err(gained);
        };
        state.xp -= threshold(state.level);
        state.level = next;
        gained = gained.saturating_add(1);
    }
    Ok(gained)
}

/// Merges `update` into the topic's progress (default-initialised when missing), then
/// applies `xp_gain`.
pub fn update_topic_progress(
    state: &UserState,
    topic_id: &str,
    update: &TopicUpdate,
    xp_gain: i64,
) -> Progress {
    let mut next = state.clone();
    next.edital_progress
        .entry(topic_id.to_string())
        .or_default()
        .merge(update);
    add_experience(&next, xp_gain)
}

/// Adds `minutes` to the topic's cumulative counter, stamps the study date and grants
/// `floor(minutes / 2)` XP.
pub fn record_study_minutes(
    state: &UserState,
    topic_id: &str,
    minutes: u32,
    now: DateTime<Utc>,
) -> Progress {
    let mut next = state.clone();
    let progress = next.edital_progress.entry(topic_id.to_string()).or_default();
    progress.study_minutes = progress.study_minutes.saturating_add(minutes);
    progress.last_study_date = Some(now);
    add_experience(&next, i64::from(minutes / 2))
}

/// XP for a graded essay: the flat submission grant plus the good-score bonus.
pub fn submission_xp(score: Option<f64>) -> u32 {
    match score {
        Some(s) if s >= GOOD_SCORE_THRESHOLD => XP_PER_SUBMISSION + XP_BONUS_GOOD_SCORE,
        _ => XP_PER_SUBMISSION,
    }
}

/// Percent of the way to the next level.
pub fn level_progress(state: &UserState) -> f64 {
    let needed = threshold(state.level.max(1));
    f64::from(state.xp) / f64::from(needed) * 100.0
}

/// Aggregate read model for the dashboard. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyStats {
    pub total_minutes: u64,
    pub topics_read: usize,
    pub total_topics: usize,
    pub questions_answered: u64,
}

impl StudyStats {
    pub fn compute(state: &UserState, total_topics: usize) -> Self {
        let topics = state.edital_progress.values();
        Self {
            total_minutes: topics.clone().map(|p| u64::from(p.study_minutes)).sum(),
            topics_read: topics.clone().filter(|p| p.theory).count(),
            total_topics,
            questions_answered: topics.map(|p| u64::from(p.questions_count)).sum(),
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_minutes as f64 / 60.0
    }

    /// Share of the syllabus with theory marked as read.
    pub fn coverage_percent(&self) -> f64 {
        if self.total_topics == 0 {
            return 0.0;
        }
        self.topics_read as f64 * 100.0 / self.total_topics as f64
    }
}

/// Mean accuracy over topics with at least one answered question. With none, the
/// denominator is treated as 1 and the result is 0.
pub fn mean_accuracy(state: &UserState) -> f64 {
    let answered: Vec<f64> = state
        .edital_progress
        .values()
        .filter(|p| p.questions_count > 0)
        .map(|p| p.accuracy)
        .collect();
    answered.iter().sum::<f64>() / answered.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TopicProgress;

    fn state_at(level: u32, xp: u32) -> UserState {
        UserState {
            level,
            xp,
            ..UserState::new("ana")
        }
    }

    #[test]
    fn test_single_level_up_carries_excess() {
        let progress = add_experience(&state_at(1, 150), 80);
        assert_eq!(progress.state.level, 2);
        assert_eq!(progress.state.xp, 30);
        assert_eq!(progress.levels_gained, 1);
    }

    #[test]
    fn test_multi_level_span() {
        // 200 (L1) + 400 (L2) + 600 (L3) = 1200 leaves 10 at level 4
        let progress = add_experience(&state_at(1, 0), 1210);
        assert_eq!(progress.state.level, 4);
        assert_eq!(progress.state.xp, 10);
        assert_eq!(progress.levels_gained, 3);
        assert!(progress.leveled_up());
    }

    #[test]
    fn test_level_ceiling_caps_xp() {
        let progress = add_experience(&state_at(u32::MAX, u32::MAX - 10), 100);
        assert_eq!(progress.state.level, u32::MAX);
        assert_eq!(progress.state.xp, u32::MAX - 1);
        assert_eq!(progress.levels_gained, 0);

        let mut state = state_at(u32::MAX, u32::MAX);
        assert_eq!(try_normalize_level(&mut state), None);
    }

    #[test]
    fn test_non_positive_amounts_are_noops() {
        let state = state_at(2, 123);
        assert_eq!(add_experience(&state, 0).state, state);
        assert_eq!(add_experience(&state, -5).state, state);
        assert!(!add_experience(&state, -5).leveled_up());
    }

    #[test]
    fn test_invariant_over_a_sequence() {
        let mut state = state_at(1, 0);
        let mut last_level = state.level;
        for amount in [1_i64, 199, 7, 400, 3_000, 55, 1, 999, 12_345] {
            state = add_experience(&state, amount).state;
            assert!(state.xp < threshold(state.level));
            assert!(state.level >= last_level);
            last_level = state.level;
        }
    }

    #[test]
    fn test_update_creates_and_merges() {
        let state = state_at(1, 0);
        let first = update_topic_progress(&state, "hb-1", &TopicUpdate::default().theory(true), 50);
        assert!(first.state.edital_progress["hb-1"].theory);
        assert_eq!(first.state.xp, 50);

        let second = update_topic_progress(
            &first.state,
            "hb-1",
            &TopicUpdate::default().questions_count(10),
            0,
        );
        let topic = &second.state.edital_progress["hb-1"];
        assert!(topic.theory);
        assert_eq!(topic.questions_count, 10);
        assert_eq!(second.state.xp, 50);
    }

    #[test]
    fn test_study_minutes_accumulate_and_grant_half() {
        let now = Utc::now();
        let state = state_at(1, 0);
        let a = record_study_minutes(&state, "pi-2", 25, now);
        let b = record_study_minutes(&a.state, "pi-2", 25, now);
        assert_eq!(b.state.edital_progress["pi-2"].study_minutes, 50);
        assert_eq!(b.state.edital_progress["pi-2"].last_study_date, Some(now));
        // floor(25 / 2) twice
        assert_eq!(b.state.xp, 24);
    }

    #[test]
    fn test_coverage_percent() {
        let mut state = state_at(1, 0);
        for id in ["a", "b", "c"] {
            state.edital_progress.insert(
                id.to_string(),
                TopicProgress {
                    theory: true,
                    ..Default::default()
                },
            );
        }
        state
            .edital_progress
            .insert("d".to_string(), TopicProgress::default());
        let stats = StudyStats::compute(&state, 10);
        assert!((stats.coverage_percent() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_hours() {
        let mut state = state_at(1, 0);
        state.edital_progress.insert(
            "a".to_string(),
            TopicProgress {
                study_minutes: 90,
                ..Default::default()
            },
        );
        state.edital_progress.insert(
            "b".to_string(),
            TopicProgress {
                study_minutes: 30,
                ..Default::default()
            },
        );
        assert!((StudyStats::compute(&state, 2).total_hours() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_accuracy_without_answers_is_zero() {
        let mut state = state_at(1, 0);
        state.edital_progress.insert(
            "a".to_string(),
            TopicProgress {
                accuracy: 80.0,
                ..Default::default()
            },
        );
        let mean = mean_accuracy(&state);
        assert_eq!(mean, 0.0);
        assert!(!mean.is_nan());
    }

    #[test]
    fn test_mean_accuracy_ignores_unanswered_topics() {
        let mut state = state_at(1, 0);
        state.edital_progress.insert(
            "a".to_string(),
            TopicProgress {
                questions_count: 10,
                accuracy: 80.0,
                ..Default::default()
            },
        );
        state.edital_progress.insert(
            "b".to_string(),
            TopicProgress {
                questions_count: 5,
                accuracy: 60.0,
                ..Default::default()
            },
        );
        state.edital_progress.insert(
            "c".to_string(),
            TopicProgress {
                accuracy: 10.0,
                ..Default::default()
            },
        );
        assert!((mean_accuracy(&state) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_submission_xp() {
        assert_eq!(submission_xp(None), 100);
        assert_eq!(submission_xp(Some(6.99)), 100);
        assert_eq!(submission_xp(Some(7.0)), 150);
    }
}
