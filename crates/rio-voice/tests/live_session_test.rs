//! Integration tests for the live session against scripted devices and a scripted remote.
//!
//! No audio hardware or network is touched: the microphone pushes canned frames, the
//! speaker records what it was asked to play on a frozen clock, and the remote replays a
//! fixed list of frames before closing.

use async_trait::async_trait;
use rio_voice::pcm::{encode_frame, FRAME_SAMPLES};
use rio_voice::{
    AudioDevices, ClientMessage, Language, LiveConfig, LiveConnector, LiveSession, LiveTransport,
    MicrophoneSource, PlaybackSink, Role, ServerMessage, SessionEvent, SessionState, Setup,
    VoiceError, VoiceResult,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct Rig {
    clock: f64,
    scheduled: Vec<(u64, f64)>,
    stopped: Vec<u64>,
    sink_closed: bool,
    mic_started: bool,
    mic_stopped: bool,
    connects: usize,
    sent: Vec<ClientMessage>,
    transport_closed: bool,
}

type Shared = Arc<Mutex<Rig>>;

struct FakeMic {
    rig: Shared,
    frames: usize,
    tx: Option<mpsc::UnboundedSender<Vec<f32>>>,
}

impl MicrophoneSource for FakeMic {
    fn start(&mut self, frames: mpsc::UnboundedSender<Vec<f32>>) -> VoiceResult<()> {
        for _ in 0..self.frames {
            frames.send(vec![0.25; FRAME_SAMPLES]).unwrap();
        }
        self.tx = Some(frames);
        self.rig.lock().unwrap().mic_started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.tx = None;
        self.rig.lock().unwrap().mic_stopped = true;
    }
}

struct FakeSink {
    rig: Shared,
}

impl PlaybackSink for FakeSink {
    fn current_time(&self) -> f64 {
        self.rig.lock().unwrap().clock
    }

    fn schedule(&mut self, id: u64, _samples: Vec<f32>, _rate: u32, start_at: f64) -> VoiceResult<()> {
        self.rig.lock().unwrap().scheduled.push((id, start_at));
        Ok(())
    }

    fn stop(&mut self, id: u64) {
        self.rig.lock().unwrap().stopped.push(id);
    }

    fn close(&mut self) {
        self.rig.lock().unwrap().sink_closed = true;
    }
}

struct FakeDevices {
    rig: Shared,
    mic_denied: bool,
    frames: usize,
}

impl AudioDevices for FakeDevices {
    fn open_microphone(&self) -> VoiceResult<Box<dyn MicrophoneSource>> {
        if self.mic_denied {
            return Err(VoiceError::Device("permission denied".to_string()));
        }
        Ok(Box::new(FakeMic {
            rig: self.rig.clone(),
            frames: self.frames,
            tx: None,
        }))
    }

    fn open_playback(&self) -> VoiceResult<Box<dyn PlaybackSink>> {
        Ok(Box::new(FakeSink { rig: self.rig.clone() }))
    }
}

struct ScriptedConnector {
    rig: Shared,
    script: Mutex<VecDeque<Result<ServerMessage, String>>>,
    hold_open: bool,
}

#[async_trait]
impl LiveConnector for ScriptedConnector {
    async fn connect(&self, setup: Setup) -> VoiceResult<Box<dyn LiveTransport>> {
        {
            let mut rig = self.rig.lock().unwrap();
            rig.connects += 1;
            rig.sent.push(ClientMessage::Setup(setup));
        }
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        Ok(Box::new(ScriptedTransport {
            rig: self.rig.clone(),
            script,
            hold_open: self.hold_open,
        }))
    }
}

struct ScriptedTransport {
    rig: Shared,
    script: VecDeque<Result<ServerMessage, String>>,
    hold_open: bool,
}

#[async_trait]
impl LiveTransport for ScriptedTransport {
    async fn send(&mut self, message: ClientMessage) -> VoiceResult<()> {
        self.rig.lock().unwrap().sent.push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<VoiceResult<ServerMessage>> {
        match self.script.pop_front() {
            Some(Ok(message)) => Some(Ok(message)),
            Some(Err(reason)) => Some(Err(VoiceError::Remote(reason))),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) {
        self.rig.lock().unwrap().transport_closed = true;
    }
}

fn frame(value: serde_json::Value) -> Result<ServerMessage, String> {
    Ok(ServerMessage::parse(&value.to_string()).unwrap())
}

fn audio(samples: usize) -> Result<ServerMessage, String> {
    frame(json!({"serverContent": {"modelTurn": {"parts": [
        {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": encode_frame(&vec![0.1; samples])}}
    ]}}}))
}

fn rig() -> Shared {
    Arc::new(Mutex::new(Rig::default()))
}

fn devices(rig: &Shared) -> FakeDevices {
    FakeDevices {
        rig: rig.clone(),
        mic_denied: false,
        frames: 2,
    }
}

fn connector(rig: &Shared, script: Vec<Result<ServerMessage, String>>, hold_open: bool) -> ScriptedConnector {
    ScriptedConnector {
        rig: rig.clone(),
        script: Mutex::new(script.into()),
        hold_open,
    }
}

#[tokio::test]
async fn full_turn_with_barge_in() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let rig = rig();
    let script = vec![
        audio(12_000),
        audio(12_000),
        audio(12_000),
        frame(json!({"serverContent": {"interrupted": true}})),
        audio(12_000),
        frame(json!({"serverContent": {"inputTranscription": {"text": "Bom "}}})),
        frame(json!({"serverContent": {"inputTranscription": {"text": "dia"}}})),
        frame(json!({"serverContent": {"outputTranscription": {"text": "Bonjour"}, "turnComplete": true}})),
        frame(json!({"serverContent": {"turnComplete": true}})),
    ];
    let connector = connector(&rig, script, false);

    let (mut session, mut events) = LiveSession::new(LiveConfig::default());
    session
        .connect(Language::French, &devices(&rig), &connector)
        .await
        .unwrap();
    assert!(session.is_connected());

    session.run(std::future::pending::<()>()).await.unwrap();
    assert_eq!(session.state(), &SessionState::Disconnected);

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!((transcript[0].role, transcript[0].text.as_str()), (Role::User, "Bom dia"));
    assert_eq!((transcript[1].role, transcript[1].text.as_str()), (Role::Model, "Bonjour"));

    let rig = rig.lock().unwrap();
    // three half-second buffers back to back on a frozen clock
    assert_eq!(rig.scheduled[..3], [(0, 0.0), (1, 0.5), (2, 1.0)]);
    assert_eq!(rig.stopped[..3], [0, 1, 2]);
    // after the barge-in the schedule restarts at the clock
    assert_eq!(rig.scheduled[3], (3, 0.0));

    assert!(matches!(&rig.sent[0], ClientMessage::Setup(s) if s.system_instruction.parts[0].text.contains("idioma Francês")));
    let frames_sent = rig
        .sent
        .iter()
        .filter(|m| matches!(m, ClientMessage::RealtimeInput(r) if r.media_chunks[0].mime_type == "audio/pcm;rate=16000"))
        .count();
    assert_eq!(frames_sent, 2);

    assert!(rig.mic_stopped && rig.sink_closed && rig.transport_closed);
    drop(rig);

    let events: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(events.first(), Some(&SessionEvent::StateChanged(SessionState::Connecting)));
    assert!(events.contains(&SessionEvent::Interrupted { stopped: 3 }));
    assert_eq!(events.last(), Some(&SessionEvent::StateChanged(SessionState::Disconnected)));
}

#[tokio::test]
async fn denied_microphone_is_terminal() {
    let rig = rig();
    let devices = FakeDevices {
        rig: rig.clone(),
        mic_denied: true,
        frames: 0,
    };
    let connector = connector(&rig, Vec::new(), false);

    let (mut session, _events) = LiveSession::new(LiveConfig::default());
    let err = session
        .connect(Language::Portuguese, &devices, &connector)
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::Device(_)));
    assert!(matches!(session.state(), SessionState::Failed(_)));

    let rig = rig.lock().unwrap();
    assert_eq!(rig.connects, 0);
    assert!(!rig.mic_started);
}

#[tokio::test]
async fn remote_error_fails_and_releases() {
    let rig = rig();
    let connector = connector(&rig, vec![audio(2_400), Err("socket reset".to_string())], false);

    let (mut session, _events) = LiveSession::new(LiveConfig::default());
    session
        .connect(Language::English, &devices(&rig), &connector)
        .await
        .unwrap();
    let err = session.run(std::future::pending::<()>()).await.unwrap_err();
    assert!(matches!(err, VoiceError::Remote(_)));
    assert_eq!(
        session.state(),
        &SessionState::Failed("Remote session error: socket reset".to_string())
    );

    let rig = rig.lock().unwrap();
    assert!(rig.mic_stopped && rig.sink_closed);
}

#[tokio::test]
async fn shutdown_ends_an_open_session() {
    let rig = rig();
    let connector = connector(&rig, Vec::new(), true);

    let (mut session, _events) = LiveSession::new(LiveConfig::default());
    session
        .connect(Language::Spanish, &devices(&rig), &connector)
        .await
        .unwrap();
    session.run(async {}).await.unwrap();
    assert_eq!(session.state(), &SessionState::Disconnected);
    assert!(rig.lock().unwrap().mic_stopped);
}

#[test]
fn disconnect_is_idempotent() {
    tokio_test::block_on(async {
        let rig = rig();
        let connector = connector(&rig, Vec::new(), true);
        let (mut session, _events) = LiveSession::new(LiveConfig::default());

        session.disconnect().await;
        assert_eq!(session.state(), &SessionState::Disconnected);

        session
            .connect(Language::Portuguese, &devices(&rig), &connector)
            .await
            .unwrap();
        session.disconnect().await;
        session.disconnect().await;
        assert_eq!(session.state(), &SessionState::Disconnected);

        let rig = rig.lock().unwrap();
        assert!(rig.mic_stopped && rig.sink_closed && rig.transport_closed);
    });
}

#[test]
fn dropping_a_connected_session_releases_devices() {
    tokio_test::block_on(async {
        let rig = rig();
        let connector = connector(&rig, Vec::new(), true);
        let (mut session, _events) = LiveSession::new(LiveConfig::default());
        session
            .connect(Language::Portuguese, &devices(&rig), &connector)
            .await
            .unwrap();
        drop(session);

        let rig = rig.lock().unwrap();
        assert!(rig.mic_stopped && rig.sink_closed);
    });
}
