//! Gapless playback scheduling with barge-in.
//!
//! Each inbound buffer starts at the later of the sink clock and the end of the previously
//! scheduled buffer. An interruption stops every buffer still scheduled or playing and
//! rewinds the schedule to zero, so the next buffer starts at the clock, not at a stale
//! offset.

use tracing::debug;

use crate::audio::PlaybackSink;
use crate::error::VoiceResult;
use crate::pcm::{duration_secs, OUTPUT_SAMPLE_RATE};

/// One buffer handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub id: u64,
    pub start: f64,
    pub end: f64,
}

pub struct PlaybackScheduler {
    sink: Box<dyn PlaybackSink>,
    sample_rate: u32,
    next_start: f64,
    next_id: u64,
    active: Vec<ScheduledBuffer>,
}

impl PlaybackScheduler {
    pub fn new(sink: Box<dyn PlaybackSink>) -> Self {
        Self::with_sample_rate(sink, OUTPUT_SAMPLE_RATE)
    }

    pub fn with_sample_rate(sink: Box<dyn PlaybackSink>, sample_rate: u32) -> Self {
        Self {
            sink,
            sample_rate,
            next_start: 0.0,
            next_id: 0,
            active: Vec::new(),
        }
    }

    /// Where the next buffer would start if nothing else moved the clock.
    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// Buffers scheduled or playing right now.
    pub fn pending(&self) -> usize {
        let now = self.sink.current_time();
        self.active.iter().filter(|b| b.end > now).count()
    }

    pub fn enqueue(&mut self, samples: Vec<f32>) -> VoiceResult<ScheduledBuffer> {
        let now = self.sink.current_time();
        self.active.retain(|b| b.end > now);

        self.next_start = self.next_start.max(now);
        let start = self.next_start;
        let end = start + duration_secs(samples.len(), self.sample_rate);
        let id = self.next_id;
        self.next_id += 1;

        self.sink.schedule(id, samples, self.sample_rate, start)?;
        self.next_start = end;

        let buffer = ScheduledBuffer { id, start, end };
        self.active.push(buffer);
        Ok(buffer)
    }

    /// Stops everything still scheduled or playing. Returns how many buffers were cut.
    pub fn interrupt(&mut self) -> usize {
        let now = self.sink.current_time();
        let mut stopped = 0;
        for buffer in self.active.drain(..) {
            self.sink.stop(buffer.id);
            if buffer.end > now {
                stopped += 1;
            }
        }
        self.next_start = 0.0;
        debug!(stopped, "playback interrupted");
        stopped
    }

    pub fn close(&mut self) {
        self.interrupt();
        self.sink.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        clock: f64,
        scheduled: Vec<(u64, f64)>,
        stopped: Vec<u64>,
        closed: bool,
    }

    struct FakeSink(Arc<Mutex<Log>>);

    impl PlaybackSink for FakeSink {
        fn current_time(&self) -> f64 {
            self.0.lock().unwrap().clock
        }
        fn schedule(&mut self, id: u64, _samples: Vec<f32>, _rate: u32, start_at: f64) -> VoiceResult<()> {
            self.0.lock().unwrap().scheduled.push((id, start_at));
            Ok(())
        }
        fn stop(&mut self, id: u64) {
            self.0.lock().unwrap().stopped.push(id);
        }
        fn close(&mut self) {
            self.0.lock().unwrap().closed = true;
        }
    }

    fn scheduler() -> (PlaybackScheduler, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        (PlaybackScheduler::new(Box::new(FakeSink(log.clone()))), log)
    }

    fn half_second() -> Vec<f32> {
        vec![0.0; 12_000]
    }

    #[test]
    fn test_buffers_play_back_to_back() {
        let (mut scheduler, _log) = scheduler();
        let a = scheduler.enqueue(half_second()).unwrap();
        let b = scheduler.enqueue(half_second()).unwrap();
        assert_eq!((a.start, a.end), (0.0, 0.5));
        assert_eq!(b.start, a.end);
    }

    #[test]
    fn test_late_buffer_starts_at_clock() {
        let (mut scheduler, log) = scheduler();
        scheduler.enqueue(half_second()).unwrap();
        log.lock().unwrap().clock = 2.0;
        let late = scheduler.enqueue(half_second()).unwrap();
        assert_eq!(late.start, 2.0);
    }

    #[test]
    fn test_interrupt_stops_all_and_rewinds() {
        let (mut scheduler, log) = scheduler();
        log.lock().unwrap().clock = 1.0;
        for _ in 0..3 {
            scheduler.enqueue(half_second()).unwrap();
        }
        assert_eq!(scheduler.next_start(), 2.5);

        assert_eq!(scheduler.interrupt(), 3);
        assert_eq!(log.lock().unwrap().stopped, vec![0, 1, 2]);
        assert_eq!(scheduler.next_start(), 0.0);
        assert_eq!(scheduler.pending(), 0);

        let next = scheduler.enqueue(half_second()).unwrap();
        assert_eq!(next.start, 1.0);
    }

    #[test]
    fn test_close_releases_sink() {
        let (mut scheduler, log) = scheduler();
        scheduler.enqueue(half_second()).unwrap();
        scheduler.close();
        let log = log.lock().unwrap();
        assert!(log.closed);
        assert_eq!(log.stopped, vec![0]);
    }
}
