use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{clamp_minutes, elapsed_percent, Countdown, TimerError, TimerEvent, TimerMode, TimerState};
use crate::sound::{Cue, SoundCues};

/// Full-screen countdown. Starts Running; finishing or exiting hands control back to the
/// caller through [`TimerEvent::Exited`].
pub struct FocusTimer {
    mode: TimerMode,
    total_secs: u32,
    remaining_secs: u32,
    state: TimerState,
    cues: SoundCues,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl FocusTimer {
    pub fn new(
        minutes: u32,
        mode: TimerMode,
        cues: SoundCues,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let total_secs = clamp_minutes(i64::from(minutes)) * 60;
        let timer = Self {
            mode,
            total_secs,
            remaining_secs: total_secs,
            state: TimerState::Running,
            cues,
            event_tx,
        };
        timer.emit(TimerEvent::Started {
            mode,
            remaining_secs: total_secs,
        });
        (timer, event_rx)
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn progress_percent(&self) -> f64 {
        elapsed_percent(self.total_secs, self.remaining_secs)
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.emit(TimerEvent::Started {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                });
                Ok(())
            }
            TimerState::Paused => self.resume(),
            state => Err(TimerError::InvalidTransition {
                action: "start",
                state,
            }),
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
        self.emit(TimerEvent::Resumed {
            remaining_secs: self.remaining_secs,
        });
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => self.pause(),
            _ => self.start(),
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_secs = self.total_secs;
        self.emit(TimerEvent::Reset {
            remaining_secs: self.remaining_secs,
        });
    }

    /// Leaves the focus screen before the countdown finished.
    pub fn exit(&mut self) {
        if self.state == TimerState::Completed {
            return;
        }
        info!(remaining = self.remaining_secs, "deep focus exited early");
        self.state = TimerState::Idle;
        self.emit(TimerEvent::Exited { completed: false });
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("focus event dropped: no listener");
        }
    }
}

impl Countdown for FocusTimer {
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
            self.state = TimerState::Completed;
            self.cues.play(Cue::TimerEnd);
            info!(mode = ?self.mode, "deep focus completed");
            self.emit(TimerEvent::Completed { mode: self.mode });
            self.emit(TimerEvent::Exited { completed: true });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::drive;

    #[test]
    fn test_starts_running() {
        let (timer, mut rx) = FocusTimer::new(10, TimerMode::Work, SoundCues::default());
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining_secs(), 600);
        assert_eq!(
            rx.try_recv().unwrap(),
            TimerEvent::Started {
                mode: TimerMode::Work,
                remaining_secs: 600
            }
        );
    }

    #[test]
    fn test_length_is_capped() {
        let (timer, _rx) = FocusTimer::new(u32::MAX, TimerMode::Work, SoundCues::default());
        assert_eq!(timer.total_secs(), crate::timer::MAX_TIMER_MINUTES * 60);
        let (timer, _rx) = FocusTimer::new(0, TimerMode::Work, SoundCues::default());
        assert_eq!(timer.total_secs(), 60);
    }

    #[test]
    fn test_toggle_and_reset() {
        let (mut timer, _rx) = FocusTimer::new(1, TimerMode::Break, SoundCues::default());
        timer.tick();
        timer.toggle().unwrap();
        assert_eq!(timer.state(), TimerState::Paused);
        timer.toggle().unwrap();
        assert_eq!(timer.state(), TimerState::Running);
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_secs(), 60);
        timer.start().unwrap();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn test_exit_reports_incomplete() {
        let (mut timer, mut rx) = FocusTimer::new(1, TimerMode::Work, SoundCues::default());
        timer.exit();
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.last(), Some(&TimerEvent::Exited { completed: false }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_runs_to_completion() {
        let (mut timer, mut rx) = FocusTimer::new(1, TimerMode::Work, SoundCues::default());
        let end = drive(&mut timer).await;
        assert_eq!(end, TimerState::Completed);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.progress_percent(), 100.0);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let ticks = events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Tick { .. }))
            .count();
        assert_eq!(ticks, 60);
        assert_eq!(events.last(), Some(&TimerEvent::Exited { completed: true }));
    }
}
