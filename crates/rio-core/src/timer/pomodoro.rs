//! Pomodoro work/break cycle.
//!
//! Work intervals need a syllabus topic. When one finishes the machine switches to break
//! mode and holds a [`StudyCommit`] until the candidate confirms or dismisses it; nothing
//! is granted before that. Starting again is refused while a commit is pending.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{clamp_minutes, elapsed_percent, Countdown, FocusTimer, TimerError, TimerEvent, TimerMode, TimerState};
use crate::sound::{Cue, SoundCues};

#[derive(Debug, Clone)]
pub struct PomodoroConfig {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
        }
    }
}

/// Minutes studied on a topic, waiting for confirmation before they reach the progress model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyCommit {
    pub topic_id: String,
    pub minutes: u32,
}

pub struct Pomodoro {
    config: PomodoroConfig,
    mode: TimerMode,
    state: TimerState,
    remaining_secs: u32,
    topic_id: Option<String>,
    pending: Option<StudyCommit>,
    cues: SoundCues,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl Pomodoro {
    pub fn new(
        config: PomodoroConfig,
        cues: SoundCues,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let config = PomodoroConfig {
            work_minutes: clamp_minutes(i64::from(config.work_minutes)),
            break_minutes: clamp_minutes(i64::from(config.break_minutes)),
        };
        let timer = Self {
            remaining_secs: config.work_minutes * 60,
            config,
            mode: TimerMode::Work,
            state: TimerState::Idle,
            topic_id: None,
            pending: None,
            cues,
            event_tx,
        };
        (timer, event_rx)
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic_id.as_deref()
    }

    pub fn pending_commit(&self) -> Option<&StudyCommit> {
        self.pending.as_ref()
    }

    pub fn work_minutes(&self) -> u32 {
        self.config.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.config.break_minutes
    }

    fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.config.work_minutes,
            TimerMode::Break => self.config.break_minutes,
        }
    }

    /// Configured length of the current mode, in seconds.
    pub fn total_secs(&self) -> u32 {
        self.minutes_for(self.mode).saturating_mul(60)
    }

    pub fn progress_percent(&self) -> f64 {
        elapsed_percent(self.total_secs(), self.remaining_secs)
    }

    /// Chooses the topic that work minutes are credited to. Locked while Running.
    pub fn select_topic(&mut self, topic_id: Option<String>) -> Result<(), TimerError> {
        if self.state == TimerState::Running {
            return Err(TimerError::InvalidTransition {
                action: "change topic",
                state: self.state,
            });
        }
        self.topic_id = topic_id.filter(|t| !t.trim().is_empty());
        Ok(())
    }

    /// Idle/Completed → Running. From Paused this is a resume.
    pub fn start(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => Err(TimerError::InvalidTransition {
                action: "start",
                state: self.state,
            }),
            TimerState::Paused => self.resume(),
            TimerState::Idle | TimerState::Completed => {
                if self.pending.is_some() {
                    return Err(TimerError::CommitPending);
                }
                if self.mode == TimerMode::Work && self.topic_id.is_none() {
                    return Err(TimerError::NoTopicSelected);
                }
                self.state = TimerState::Running;
                self.cues.play(Cue::Meow);
                info!(mode = ?self.mode, remaining = self.remaining_secs, "pomodoro started");
                self.emit(TimerEvent::Started {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                });
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::Running {
            return Err(TimerError::InvalidTransition {
                action: "pause",
                state: self.state,
            });
        }
        self.state = TimerState::Paused;
        self.emit(TimerEvent::Paused {
            remaining_secs: self.remaining_secs,
        });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::Paused {
            return Err(TimerError::InvalidTransition {
                action: "resume",
                state: self.state,
            });
        }
        self.state = TimerState::Running;
        self.cues.play(Cue::Meow);
        self.emit(TimerEvent::Resumed {
            remaining_secs: self.remaining_secs,
        });
        Ok(())
    }

    /// Start/pause button.
    pub fn toggle(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => self.pause(),
            _ => self.start(),
        }
    }

    /// Back to Idle with the counter at the current mode's full length. The pending
    /// commit, if any, survives.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_secs = self.total_secs();
        self.emit(TimerEvent::Reset {
            remaining_secs: self.remaining_secs,
        });
    }

    /// Changes the length of `mode` by `delta_minutes`, clamped to `1..=MAX_TIMER_MINUTES`.
    /// Rejected while Running.
    pub fn adjust(&mut self, mode: TimerMode, delta_minutes: i32) -> Result<u32, TimerError> {
        if self.state == TimerState::Running {
            return Err(TimerError::AdjustWhileRunning);
        }
        let current = i64::from(self.minutes_for(mode));
        let next = clamp_minutes(current + i64::from(delta_minutes));
        match mode {
            TimerMode::Work => self.config.work_minutes = next,
            TimerMode::Break => self.config.break_minutes = next,
        }
        if mode == self.mode {
            self.remaining_secs = next.saturating_mul(60);
        }
        Ok(next)
    }

    /// Takes the pending commit. The caller credits it to the progress model.
    pub fn confirm_commit(&mut self) -> Option<StudyCommit> {
        let commit = self.pending.take()?;
        self.cues.play(Cue::Success);
        info!(topic = %commit.topic_id, minutes = commit.minutes, "study minutes confirmed");
        Some(commit)
    }

    /// Drops the pending commit without crediting anything.
    pub fn dismiss_commit(&mut self) -> Option<StudyCommit> {
        self.pending.take()
    }

    /// Hands the work duration and current mode to a full-screen focus countdown.
    pub fn deep_focus(&self) -> Result<(FocusTimer, mpsc::UnboundedReceiver<TimerEvent>), TimerError> {
        if self.topic_id.is_none() {
            return Err(TimerError::NoTopicSelected);
        }
        Ok(FocusTimer::new(
            self.config.work_minutes,
            self.mode,
            self.cues.clone(),
        ))
    }

    fn complete(&mut self) {
        let finished = self.mode;
        self.state = TimerState::Completed;
        self.cues.play(Cue::TimerEnd);
        info!(mode = ?finished, "pomodoro interval completed");
        self.emit(TimerEvent::Completed { mode: finished });

        match finished {
            TimerMode::Work => {
                if let Some(topic_id) = self.topic_id.clone() {
                    let commit = StudyCommit {
                        topic_id,
                        minutes: self.config.work_minutes,
                    };
                    self.emit(TimerEvent::CommitRequested {
                        topic_id: commit.topic_id.clone(),
                        minutes: commit.minutes,
                    });
                    self.pending = Some(commit);
                }
                self.cues.play(Cue::Purr);
            }
            TimerMode::Break => self.cues.play(Cue::Meow),
        }

        self.mode = finished.other();
        self.remaining_secs = self.total_secs();
        self.emit(TimerEvent::ModeChanged { mode: self.mode });
    }

    fn emit(&self, event: TimerEvent) {
        // The receiver may be gone (headless use); the machine keeps working regardless.
        if self.event_tx.send(event).is_err() {
            debug!("pomodoro event dropped: no listener");
        }
    }
}

impl Countdown for Pomodoro {
    fn state(&self) -> TimerState {
        self.state
    }

    fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    fn tick(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.emit(TimerEvent::Tick {
            remaining_secs: self.remaining_secs,
        });
        if self.remaining_secs == 0 {
            self.complete();
        }
    }
}
