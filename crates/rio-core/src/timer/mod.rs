//! Countdown state machines: the pomodoro work/break cycle and the standalone deep-focus
//! countdown.
//!
//! Both machines move through Idle → Running ⇄ Paused → Completed with a one-second
//! counter. They are ticked either by hand (`tick`) or by [`drive`], which runs a tokio
//! interval while the machine is Running.

mod focus;
mod pomodoro;

pub use focus::FocusTimer;
pub use pomodoro::{Pomodoro, PomodoroConfig, StudyCommit};

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("Select a syllabus topic before starting a work interval")]
    NoTopicSelected,

    #[error("Confirm or dismiss the finished work interval first")]
    CommitPending,

    #[error("Durations cannot change while the timer is running")]
    AdjustWhileRunning,

    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: TimerState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Work,
    Break,
}

impl TimerMode {
    pub fn other(&self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

/// Longest interval either machine accepts: one day.
pub const MAX_TIMER_MINUTES: u32 = 24 * 60;

/// Clamps a requested length to `1..=MAX_TIMER_MINUTES`.
pub(crate) fn clamp_minutes(minutes: i64) -> u32 {
    u32::try_from(minutes.clamp(1, i64::from(MAX_TIMER_MINUTES))).unwrap_or(MAX_TIMER_MINUTES)
}

/// Events emitted by both machines.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Started { mode: TimerMode, remaining_secs: u32 },
    Paused { remaining_secs: u32 },
    Resumed { remaining_secs: u32 },
    Tick { remaining_secs: u32 },
    /// The counter reached zero in `mode`.
    Completed { mode: TimerMode },
    /// A work interval finished; the candidate must confirm before the minutes count.
    CommitRequested { topic_id: String, minutes: u32 },
    /// The pomodoro switched to `mode` after a completion.
    ModeChanged { mode: TimerMode },
    Reset { remaining_secs: u32 },
    /// The focus countdown handed control back to its caller.
    Exited { completed: bool },
}

/// Common surface used by [`drive`].
pub trait Countdown {
    fn state(&self) -> TimerState;
    fn remaining_secs(&self) -> u32;
    /// Advances one second. Only has an effect while Running.
    fn tick(&mut self);
}

/// Ticks `timer` once per second while it is Running. Returns the state it stopped in.
pub async fn drive<C: Countdown>(timer: &mut C) -> TimerState {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // first tick fires immediately
    interval.tick().await;
    while timer.state() == TimerState::Running {
        interval.tick().await;
        timer.tick();
    }
    debug!(state = ?timer.state(), remaining = timer.remaining_secs(), "countdown stopped");
    timer.state()
}

/// `MM:SS` rendering of a second counter.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed share of `total_secs`, in percent.
pub(crate) fn elapsed_percent(total_secs: u32, remaining_secs: u32) -> f64 {
    if total_secs == 0 {
        return 100.0;
    }
    f64::from(total_secs.saturating_sub(remaining_secs)) / f64::from(total_secs) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn test_elapsed_percent() {
        assert_eq!(elapsed_percent(100, 100), 0.0);
        assert_eq!(elapsed_percent(100, 25), 75.0);
        assert_eq!(elapsed_percent(0, 0), 100.0);
    }
}
