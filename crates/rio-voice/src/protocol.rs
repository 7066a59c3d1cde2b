//! Realtime wire protocol: JSON text frames over a websocket.
//!
//! Outbound: one `setup` frame, then a `realtimeInput` frame per capture frame. Inbound:
//! `setupComplete`, then `serverContent` frames carrying audio parts, transcription deltas,
//! `interrupted` and `turnComplete`. Unknown frames and fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::VoiceResult;
use crate::pcm::{encode_frame, INPUT_MIME};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    /// One capture frame as a media chunk.
    pub fn audio_frame(samples: &[f32]) -> Self {
        Self::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: INPUT_MIME.to_string(),
                data: encode_frame(samples),
            }],
        })
    }

    pub fn to_json(&self) -> VoiceResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: Content,
    pub input_audio_transcription: TranscriptionConfig,
    pub output_audio_transcription: TranscriptionConfig,
}

impl Setup {
    /// Audio-only replies in `voice_name`, transcription on both sides.
    pub fn new(model: &str, voice_name: &str, system_prompt: String) -> Self {
        Self {
            model: model.to_string(),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_string(),
                        },
                    },
                },
            },
            system_instruction: Content {
                parts: vec![TextPart { text: system_prompt }],
            },
            input_audio_transcription: TranscriptionConfig {},
            output_audio_transcription: TranscriptionConfig {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// Serialises as `{}`: presence alone switches transcription on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionConfig {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

/// Inbound frame. Every field is optional; the remote sends one concern per frame in
/// practice but nothing here relies on that.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<Value>,
    pub server_content: Option<ServerContent>,
    pub go_away: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    pub interrupted: bool,
    pub turn_complete: bool,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelTurn {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Part {
    pub inline_data: Option<MediaChunk>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Transcription {
    pub text: String,
}

/// What a frame asks the session to do, in handling order.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    SetupComplete,
    /// Base64 PCM at 24 kHz.
    Audio(String),
    Interrupted,
    InputTranscript(String),
    OutputTranscript(String),
    TurnComplete,
    GoAway,
}

impl ServerMessage {
    pub fn parse(text: &str) -> VoiceResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn parse_bytes(bytes: &[u8]) -> VoiceResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Audio first, then the interruption, transcripts, and the turn boundary last so the
    /// flush sees this frame's deltas.
    pub fn into_events(self) -> Vec<Inbound> {
        let mut events = Vec::new();
        if self.setup_complete.is_some() {
            events.push(Inbound::SetupComplete);
        }
        if let Some(content) = self.server_content {
            if let Some(turn) = content.model_turn {
                events.extend(
                    turn.parts
                        .into_iter()
                        .filter_map(|p| p.inline_data)
                        .filter(|d| !d.data.is_empty())
                        .map(|d| Inbound::Audio(d.data)),
                );
            }
            if content.interrupted {
                events.push(Inbound::Interrupted);
            }
            if let Some(t) = content.input_transcription.filter(|t| !t.text.is_empty()) {
                events.push(Inbound::InputTranscript(t.text));
            }
            if let Some(t) = content.output_transcription.filter(|t| !t.text.is_empty()) {
                events.push(Inbound::OutputTranscript(t.text));
            }
            if content.turn_complete {
                events.push(Inbound::TurnComplete);
            }
        }
        if self.go_away.is_some() {
            events.push(Inbound::GoAway);
        }
        events
    }
}
