//! Live conversation practice.

use anyhow::anyhow;
use clap::Args;
use rio_core::{RioConfig, UserConfig};
use rio_voice::{Language, LiveConfig, LiveSession, Role, SessionEvent, SessionState, SystemAudio, WsConnector};

#[derive(Args, Debug)]
pub struct VoiceArgs {
    /// Conversation language: pt, en, fr or es
    #[arg(short, long, default_value = "pt")]
    pub language: String,

    /// Prebuilt voice name (overrides the configured one)
    #[arg(long)]
    pub voice: Option<String>,
}

pub async fn run(config: &RioConfig, user: &UserConfig, args: VoiceArgs) -> anyhow::Result<()> {
    let language: Language = args.language.parse()?;
    let api_key = user
        .get_api_key()
        .ok_or_else(|| anyhow!("no API key configured; set GEMINI_API_KEY or run `rio key <chave>`"))?;

    let connector = WsConnector::new(&config.live_url, &api_key);
    let (mut session, mut events) = LiveSession::new(LiveConfig {
        model: config.live_model.clone(),
        voice_name: args.voice.unwrap_or_else(|| config.voice_name.clone()),
        language,
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::StateChanged(SessionState::Connected) => {
                    println!("🎙️ Conectado. Fale com o mentor; Ctrl-C encerra.");
                }
                SessionEvent::StateChanged(SessionState::Failed(reason)) => {
                    println!("❌ Sessão encerrada: {}", reason);
                }
                SessionEvent::StateChanged(_) => {}
                SessionEvent::Transcript(entry) => {
                    let who = match entry.role {
                        Role::User => "Você",
                        Role::Model => "Mentor",
                    };
                    println!("{}: {}", who, entry.text);
                }
                SessionEvent::Interrupted { .. } => {}
            }
        }
    });

    session.connect(language, &SystemAudio::default(), &connector).await?;
    let outcome = session
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        })
        .await;

    drop(session);
    printer.await?;
    outcome?;
    Ok(())
}
