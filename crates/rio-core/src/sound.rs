//! Sound cues as an explicit context object.
//!
//! Components that want to chime receive a [`SoundCues`] handle; there is no process-wide
//! mute switch. Clones share the mute flag and the player.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Meow,
    Purr,
    LevelUp,
    Success,
    TimerEnd,
}

impl Cue {
    pub fn volume(&self) -> f32 {
        match self {
            Self::LevelUp => 0.6,
            _ => 0.4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Meow => "meow",
            Self::Purr => "purr",
            Self::LevelUp => "level_up",
            Self::Success => "success",
            Self::TimerEnd => "timer_end",
        }
    }
}

/// Something that can actually emit a cue (speaker, terminal bell, test recorder).
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue, volume: f32);
}

/// Default player: records the cue in the trace log.
#[derive(Debug, Default)]
pub struct LogCuePlayer;

impl CuePlayer for LogCuePlayer {
    fn play(&self, cue: Cue, volume: f32) {
        debug!(cue = cue.name(), volume, "sound cue");
    }
}

#[derive(Clone)]
pub struct SoundCues {
    muted: Arc<AtomicBool>,
    player: Arc<dyn CuePlayer>,
}

impl Default for SoundCues {
    fn default() -> Self {
        Self::new(Arc::new(LogCuePlayer), false)
    }
}

impl SoundCues {
    pub fn new(player: Arc<dyn CuePlayer>, muted: bool) -> Self {
        Self {
            muted: Arc::new(AtomicBool::new(muted)),
            player,
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Plays `cue` unless muted.
    pub fn play(&self, cue: Cue) {
        if self.is_muted() {
            return;
        }
        self.player.play(cue, cue.volume());
    }
}

/// Player that remembers every cue. Handy for asserting cue sequences in tests.
#[derive(Debug, Default)]
pub struct RecordingCuePlayer {
    played: std::sync::Mutex<Vec<Cue>>,
}

impl RecordingCuePlayer {
    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl CuePlayer for RecordingCuePlayer {
    fn play(&self, cue: Cue, _volume: f32) {
        if let Ok(mut played) = self.played.lock() {
            played.push(cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_cues_are_dropped() {
        let recorder = Arc::new(RecordingCuePlayer::default());
        let cues = SoundCues::new(recorder.clone(), false);
        cues.play(Cue::Meow);
        cues.set_muted(true);
        cues.play(Cue::LevelUp);
        assert_eq!(recorder.played(), vec![Cue::Meow]);
    }

    #[test]
    fn test_clones_share_mute_flag() {
        let cues = SoundCues::default();
        let other = cues.clone();
        other.set_muted(true);
        assert!(cues.is_muted());
    }
}
