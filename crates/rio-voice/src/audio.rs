//! Audio capture and playback using CPAL and Rodio
//!
//! The session talks to the hardware through [`MicrophoneSource`] and [`PlaybackSink`] so it
//! can run against test doubles. cpal and rodio streams are not `Send` on every platform,
//! so each one lives on its own thread and is released when that thread is told to stop.

use crate::error::{VoiceError, VoiceResult};
use crate::pcm::{FRAME_SAMPLES, INPUT_SAMPLE_RATE};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use rodio::buffer::SamplesBuffer;
use rodio::Source;
use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Mono capture frames of [`FRAME_SAMPLES`] samples at 16 kHz.
pub trait MicrophoneSource: Send {
    /// Starts pushing frames into `frames`. Fails with [`VoiceError::Device`] when the
    /// microphone is denied or missing.
    fn start(&mut self, frames: mpsc::UnboundedSender<Vec<f32>>) -> VoiceResult<()>;

    /// Releases the microphone. Safe to call more than once.
    fn stop(&mut self);
}

/// Output device with a monotonic clock, in seconds.
pub trait PlaybackSink: Send {
    fn current_time(&self) -> f64;

    /// Plays `samples` starting at `start_at` on the sink clock.
    fn schedule(&mut self, id: u64, samples: Vec<f32>, sample_rate: u32, start_at: f64) -> VoiceResult<()>;

    /// Stops and discards one scheduled or playing buffer.
    fn stop(&mut self, id: u64);

    /// Releases the device. Safe to call more than once.
    fn close(&mut self);
}

/// Opens the capture and playback sides of a session.
pub trait AudioDevices: Send + Sync {
    fn open_microphone(&self) -> VoiceResult<Box<dyn MicrophoneSource>>;
    fn open_playback(&self) -> VoiceResult<Box<dyn PlaybackSink>>;
}

/// Capture configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 16000)
    pub sample_rate: u32,

    /// Number of channels (default: 1 for mono)
    pub channels: u16,

    /// Samples per frame handed to the session (default: 4096)
    pub frame_samples: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: INPUT_SAMPLE_RATE,
            channels: 1,
            frame_samples: FRAME_SAMPLES,
        }
    }
}

/// Default input device via CPAL.
pub struct CpalMicrophone {
    config: AudioConfig,
    stop_tx: Option<std_mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalMicrophone {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            stop_tx: None,
            worker: None,
        }
    }

    /// List available input devices
    pub fn list_input_devices() -> VoiceResult<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices()?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

fn build_capture(
    config: &AudioConfig,
    frames: mpsc::UnboundedSender<Vec<f32>>,
) -> VoiceResult<cpal::Stream> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| VoiceError::Device("No input device available".to_string()))?;
    info!("🎤 Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

    let stream_config = StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let frame_samples = config.frame_samples;
    let channels = usize::from(config.channels.max(1));
    let mut frame = Vec::with_capacity(frame_samples);

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // first channel only
            for sample in data.iter().step_by(channels) {
                frame.push(*sample);
                if frame.len() >= frame_samples {
                    let full = std::mem::replace(&mut frame, Vec::with_capacity(frame_samples));
                    if frames.send(full).is_err() {
                        debug!("capture frame dropped: session gone");
                    }
                }
            }
        },
        move |err| {
            warn!("Audio input stream error: {}", err);
        },
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

/// A microphone that cannot open its stream is unavailable, whatever cpal called it.
fn capture_error(err: VoiceError) -> VoiceError {
    match err {
        VoiceError::AudioStream(reason) => VoiceError::Device(reason),
        other => other,
    }
}

impl MicrophoneSource for CpalMicrophone {
    fn start(&mut self, frames: mpsc::UnboundedSender<Vec<f32>>) -> VoiceResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let config = self.config.clone();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<VoiceResult<()>>(1);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let worker = std::thread::Builder::new()
            .name("rio-capture".to_string())
            .spawn(move || match build_capture(&config, frames) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // hold the stream until stop() or the sender is dropped
                    let _ = stop_rx.recv();
                    drop(stream);
                    debug!("capture stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(capture_error(e)));
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("✅ Audio capture started ({}Hz)", self.config.sample_rate);
                self.stop_tx = Some(stop_tx);
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(VoiceError::Device("capture thread exited".to_string())),
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            info!("⏹️ Audio capture stopped");
        }
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Default output device via Rodio. One sink per scheduled buffer so a barge-in can stop
/// every buffer individually.
pub struct RodioPlayback {
    handle: rodio::OutputStreamHandle,
    sinks: HashMap<u64, rodio::Sink>,
    origin: Instant,
    stop_tx: Option<std_mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl RodioPlayback {
    pub fn open() -> VoiceResult<Self> {
        info!("🔊 Initializing audio playback");
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<rodio::OutputStreamHandle, String>>(1);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let worker = std::thread::Builder::new()
            .name("rio-playback".to_string())
            .spawn(move || match rodio::OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = ready_tx.send(Ok(handle));
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })?;

        let handle = match ready_rx.recv() {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(VoiceError::Device(e));
            }
            Err(_) => return Err(VoiceError::Device("playback thread exited".to_string())),
        };

        info!("✅ Audio playback initialized");
        Ok(Self {
            handle,
            sinks: HashMap::new(),
            origin: Instant::now(),
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

impl PlaybackSink for RodioPlayback {
    fn current_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn schedule(&mut self, id: u64, samples: Vec<f32>, sample_rate: u32, start_at: f64) -> VoiceResult<()> {
        self.sinks.retain(|_, sink| !sink.empty());
        let delay = (start_at - self.current_time()).max(0.0);
        let sink = rodio::Sink::try_new(&self.handle).map_err(|e| VoiceError::Playback(e.to_string()))?;
        sink.append(SamplesBuffer::new(1, sample_rate, samples).delay(Duration::from_secs_f64(delay)));
        self.sinks.insert(id, sink);
        Ok(())
    }

    fn stop(&mut self, id: u64) {
        if let Some(sink) = self.sinks.remove(&id) {
            sink.stop();
        }
    }

    fn close(&mut self) {
        for (_, sink) in self.sinks.drain() {
            sink.stop();
        }
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            info!("⏹️ Audio playback closed");
        }
    }
}

impl Drop for RodioPlayback {
    fn drop(&mut self) {
        self.close();
    }
}

/// The machine's default microphone and speaker.
#[derive(Debug, Default, Clone)]
pub struct SystemAudio {
    pub capture: AudioConfig,
}

impl AudioDevices for SystemAudio {
    fn open_microphone(&self) -> VoiceResult<Box<dyn MicrophoneSource>> {
        if cpal::default_host().default_input_device().is_none() {
            return Err(VoiceError::Device("No input device available".to_string()));
        }
        Ok(Box::new(CpalMicrophone::new(self.capture.clone())))
    }

    fn open_playback(&self) -> VoiceResult<Box<dyn PlaybackSink>> {
        Ok(Box::new(RodioPlayback::open()?))
    }
}
