//! Daily missions from the fixed weekly plan, the rotating study cycle and the context
//! summary sent along with schedule requests.

use chrono::{NaiveDate, Weekday};

use crate::shared::{SyllabusItem, UserState};
use crate::syllabus;

/// Subjects planned for each weekday. Sunday is a rest day.
pub fn weekly_plan(day: Weekday) -> &'static [&'static str] {
    match day {
        Weekday::Mon => &["Economia", "Língua Inglesa", "História do Brasil"],
        Weekday::Tue => &["Direito", "Língua Portuguesa", "Política Internacional"],
        Weekday::Wed => &["História Mundial", "Economia", "Língua Francesa"],
        Weekday::Thu => &["Direito", "Geografia", "Língua Portuguesa"],
        Weekday::Fri => &["Política Internacional", "História Mundial", "Economia"],
        Weekday::Sat => &["Língua Inglesa", "História do Brasil", "Direito"],
        Weekday::Sun => &[],
    }
}

/// A planned subject and the next unread syllabus item for it, if any is left.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    pub subject: &'static str,
    pub next_topic: Option<&'static SyllabusItem>,
}

pub fn daily_missions(day: Weekday, state: &UserState) -> Vec<Mission> {
    weekly_plan(day)
        .iter()
        .map(|&subject| Mission {
            subject,
            next_topic: syllabus::next_topic(subject, state),
        })
        .collect()
}

/// Replaces the cycle and rewinds to its first subject.
pub fn set_study_cycle(state: &mut UserState, subjects: Vec<String>) {
    state.study_cycle = subjects;
    state.current_cycle_index = 0;
}

/// Moves to the next subject, wrapping around. No-op on an empty cycle.
pub fn advance_cycle(state: &mut UserState) {
    if state.study_cycle.is_empty() {
        return;
    }
    state.current_cycle_index = (state.current_cycle_index + 1) % state.study_cycle.len();
}

pub fn current_cycle_subject(state: &UserState) -> Option<&str> {
    if state.study_cycle.is_empty() {
        return None;
    }
    state
        .study_cycle
        .get(state.current_cycle_index % state.study_cycle.len())
        .map(String::as_str)
}

/// Whole days between today and the exam, rounded up, regardless of direction.
pub fn days_until(exam: NaiveDate, today: NaiveDate) -> u32 {
    let days = (exam - today).num_days().unsigned_abs();
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// One-line progress summary attached to schedule requests.
pub fn schedule_context(state: &UserState) -> String {
    let studied = state.edital_progress.values().filter(|p| p.theory).count();
    let accuracy_sum: f64 = state.edital_progress.values().map(|p| p.accuracy).sum();
    format!(
        "{} de {} tópicos lidos. Média de acertos em questões: {:.1}%",
        studied,
        syllabus::SYLLABUS.len(),
        accuracy_sum / studied.max(1) as f64
    )
}
