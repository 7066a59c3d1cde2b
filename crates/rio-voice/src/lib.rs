//! # rio-voice - live conversation practice with the mentor
//!
//! A duplex audio session with a realtime speech model: microphone frames go out as 16 kHz
//! PCM, 24 kHz replies are scheduled back to back on the speaker, remote barge-in cuts
//! playback, and per-turn transcripts are collected for both sides.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      LiveSession                          │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │  Microphone  │ → │  PCM encode  │ → │ LiveTransport│  │
//! │  │    (cpal)    │   │   (base64)   │   │ (websocket)  │  │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘  │
//! │  ┌──────────────┐   ┌──────────────┐          │          │
//! │  │   Speaker    │ ← │  Scheduler   │ ←────────┤          │
//! │  │   (rodio)    │   │  (barge-in)  │          │          │
//! │  └──────────────┘   └──────────────┘   ┌──────┴───────┐  │
//! │                                        │  Transcripts │  │
//! │                                        └──────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod error;
pub mod language;
pub mod pcm;
pub mod playback;
pub mod protocol;
pub mod session;
pub mod transcript;
pub mod transport;

pub use audio::{AudioConfig, AudioDevices, CpalMicrophone, MicrophoneSource, PlaybackSink, RodioPlayback, SystemAudio};
pub use error::{VoiceError, VoiceResult};
pub use language::Language;
pub use playback::{PlaybackScheduler, ScheduledBuffer};
pub use protocol::{ClientMessage, Inbound, ServerMessage, Setup};
pub use session::{LiveConfig, LiveSession, SessionEvent, SessionState, DEFAULT_VOICE};
pub use transcript::{Role, TranscriptBuffer, TranscriptEntry};
pub use transport::{LiveConnector, LiveTransport, WsConnector, WsTransport};
