//! Live duplex voice session with the mentor.
//!
//! ```text
//!  mic (16 kHz) ─ frames ─> encode ─> realtimeInput ──> remote model
//!                                                         │
//!  speaker (24 kHz) <─ scheduler <─ decode <─ audio parts ┤
//!                         ▲                               │
//!                         └──── interrupted (barge-in) ───┤
//!  transcript log  <─ flush on turnComplete <─ deltas ────┘
//! ```
//!
//! State machine: Disconnected → Connecting → Connected → Disconnected, or Failed(reason)
//! from Connecting/Connected. No automatic reconnect. Every exit path releases the
//! microphone and the playback device, including drop.

use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioDevices, MicrophoneSource};
use crate::error::{VoiceError, VoiceResult};
use crate::language::Language;
use crate::pcm::decode_chunk;
use crate::playback::PlaybackScheduler;
use crate::protocol::{ClientMessage, Inbound, ServerMessage, Setup};
use crate::transcript::{TranscriptBuffer, TranscriptEntry};
use crate::transport::{LiveConnector, LiveTransport};

pub const DEFAULT_VOICE: &str = "Kore";

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub model: String,
    pub voice_name: String,
    pub language: Language,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: "models/gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice_name: DEFAULT_VOICE.to_string(),
            language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal until the next `connect`.
    Failed(String),
}

/// Events published to whoever drives the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// A finished turn, one entry per non-empty side.
    Transcript(TranscriptEntry),
    /// Remote barge-in; `stopped` buffers were cut.
    Interrupted { stopped: usize },
}

pub struct LiveSession {
    config: LiveConfig,
    state: SessionState,
    turn: TranscriptBuffer,
    log: Vec<TranscriptEntry>,
    mic: Option<Box<dyn MicrophoneSource>>,
    scheduler: Option<PlaybackScheduler>,
    transport: Option<Box<dyn LiveTransport>>,
    frames_rx: Option<mpsc::UnboundedReceiver<Vec<f32>>>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl LiveSession {
    pub fn new(config: LiveConfig) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let session = Self {
            config,
            state: SessionState::Disconnected,
            turn: TranscriptBuffer::default(),
            log: Vec::new(),
            mic: None,
            scheduler: None,
            transport: None,
            frames_rx: None,
            event_tx,
        };
        (session, event_rx)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Finished turns, oldest first.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.log
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "live session state");
        self.state = state.clone();
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("session event dropped: no listener");
        }
    }

    fn fail(&mut self, err: &VoiceError) {
        error!("❌ Live session failed: {}", err);
        self.release();
        self.set_state(SessionState::Failed(err.to_string()));
    }

    /// Opens the microphone, the speaker and the remote session, in that order, then starts
    /// streaming capture frames. A device failure is terminal and leaves nothing open.
    pub async fn connect(
        &mut self,
        language: Language,
        devices: &dyn AudioDevices,
        connector: &dyn LiveConnector,
    ) -> VoiceResult<()> {
        if matches!(self.state, SessionState::Connected | SessionState::Connecting) {
            self.disconnect().await;
        }
        self.config.language = language;
        self.turn = TranscriptBuffer::default();
        self.set_state(SessionState::Connecting);
        info!(language = %language, voice = %self.config.voice_name, "🎙️ Connecting live mentor");

        if let Err(e) = self.open(devices, connector).await {
            self.fail(&e);
            return Err(e);
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let started = match self.mic.as_mut() {
            Some(mic) => mic.start(frames_tx),
            None => Err(VoiceError::Device("microphone not open".to_string())),
        };
        if let Err(e) = started {
            self.fail(&e);
            return Err(e);
        }
        self.frames_rx = Some(frames_rx);
        self.set_state(SessionState::Connected);
        Ok(())
    }

    async fn open(&mut self, devices: &dyn AudioDevices, connector: &dyn LiveConnector) -> VoiceResult<()> {
        self.mic = Some(devices.open_microphone()?);
        self.scheduler = Some(PlaybackScheduler::new(devices.open_playback()?));
        let setup = Setup::new(
            &self.config.model,
            &self.config.voice_name,
            self.config.language.persona_prompt(),
        );
        self.transport = Some(connector.connect(setup).await?);
        Ok(())
    }

    /// Pumps capture frames out and remote frames in until `shutdown` resolves, the remote
    /// closes, or something fails. Always ends released.
    pub async fn run<F>(&mut self, shutdown: F) -> VoiceResult<()>
    where
        F: Future<Output = ()>,
    {
        let (Some(mut transport), Some(mut frames)) = (self.transport.take(), self.frames_rx.take()) else {
            return Err(VoiceError::Config("session is not connected".to_string()));
        };
        tokio::pin!(shutdown);

        let outcome: VoiceResult<()> = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Live session stop requested");
                    break Ok(());
                }
                Some(frame) = frames.recv() => {
                    if let Err(e) = transport.send(ClientMessage::audio_frame(&frame)).await {
                        break Err(e);
                    }
                }
                inbound = transport.recv() => match inbound {
                    Some(Ok(message)) => {
                        if let Err(e) = self.handle_message(message) {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => break Err(e),
                    None => {
                        info!("Remote closed the live session");
                        break Ok(());
                    }
                },
            }
        };

        transport.close().await;
        match outcome {
            Ok(()) => {
                self.release();
                self.set_state(SessionState::Disconnected);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Applies one inbound frame: schedule audio, honour barge-in, accumulate transcripts
    /// and flush them at the end of a turn. Malformed audio is logged and skipped.
    pub fn handle_message(&mut self, message: ServerMessage) -> VoiceResult<()> {
        for event in message.into_events() {
            match event {
                Inbound::Audio(data) => match decode_chunk(&data) {
                    Ok(samples) => {
                        if let Some(scheduler) = self.scheduler.as_mut() {
                            scheduler.enqueue(samples)?;
                        }
                    }
                    Err(e) => warn!("Skipping audio part: {}", e),
                },
                Inbound::Interrupted => {
                    let stopped = self
                        .scheduler
                        .as_mut()
                        .map(PlaybackScheduler::interrupt)
                        .unwrap_or(0);
                    info!(stopped, "🛑 Mentor interrupted");
                    self.emit(SessionEvent::Interrupted { stopped });
                }
                Inbound::InputTranscript(text) => self.turn.push_input(&text),
                Inbound::OutputTranscript(text) => self.turn.push_output(&text),
                Inbound::TurnComplete => {
                    for entry in self.turn.flush() {
                        self.log.push(entry.clone());
                        self.emit(SessionEvent::Transcript(entry));
                    }
                }
                Inbound::SetupComplete => {}
                Inbound::GoAway => warn!("Remote announced session shutdown"),
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut mic) = self.mic.take() {
            mic.stop();
        }
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.close();
        }
        self.frames_rx = None;
        // dropping the transport drops the socket
        self.transport = None;
    }

    /// Closes the remote session and both audio sides. Idempotent, valid in any state.
    pub async fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.release();
        self.set_state(SessionState::Disconnected);
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.release();
    }
}
