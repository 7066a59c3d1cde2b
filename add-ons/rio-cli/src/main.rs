//! Rio command-line companion
//!
//! Drives the study session from a terminal: profile login, syllabus progress, timers,
//! telex sync, backups, mentor requests and live conversation practice.

mod mentor;
mod timers;
mod voice;

use anyhow::{anyhow, bail, Context};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use rio_core::{
    current_cycle_subject, daily_missions, level_progress, rank_for, sync_code, syllabus,
    LogCuePlayer, ProfileStore, ProgressUpdate, RioConfig, SledStore, SoundCues, StudySession,
    UserConfig, REWARDS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rio")]
#[command(version, about = "Iniciativa Diplomata: companheiro de estudos para o CACD", long_about = None)]
struct Cli {
    /// Silence sound cues for this run
    #[arg(long, global = true)]
    mute: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in (creates the profile on first use)
    Login { username: String },
    /// Log out; the stored profile stays on disk
    Logout,
    /// Rank, XP, study totals and today's missions
    Status,
    /// Update one syllabus topic
    Topic {
        #[command(subcommand)]
        action: TopicAction,
    },
    /// Add studied minutes to a topic
    Study { topic_id: String, minutes: u32 },
    /// Record an essay submission, optionally with its score
    Submit {
        #[arg(long)]
        score: Option<f64>,
    },
    /// Manage the rotating study cycle
    Cycle {
        #[command(subcommand)]
        action: CycleAction,
    },
    /// Pomodoro work interval on a topic
    Pomodoro(timers::PomodoroArgs),
    /// Deep-focus countdown
    Focus(timers::FocusArgs),
    /// Telex sync code between devices
    Telex {
        #[command(subcommand)]
        action: TelexAction,
    },
    /// JSON backup file
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Requests to the mentor model
    Mentor {
        #[command(subcommand)]
        action: mentor::MentorAction,
    },
    /// Live conversation practice with the mentor
    Voice(voice::VoiceArgs),
    /// Store the personal API key in the user config file
    Key { api_key: String },
}

#[derive(Subcommand, Debug)]
enum TopicAction {
    /// Toggle the theory checkbox
    Theory { topic_id: String },
    /// Toggle the flashcards checkbox
    Flashcards { topic_id: String },
    /// Set the number of answered questions
    Questions { topic_id: String, count: i64 },
    /// Set the accuracy percentage
    Accuracy { topic_id: String, percent: f64 },
    /// Set the total studied minutes
    Minutes { topic_id: String, minutes: i64 },
}

#[derive(Subcommand, Debug)]
enum CycleAction {
    Set { subjects: Vec<String> },
    Next,
}

#[derive(Subcommand, Debug)]
enum TelexAction {
    Export,
    Import { code: String },
}

#[derive(Subcommand, Debug)]
enum BackupAction {
    Export {
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[rio] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RioConfig::load().context("load RioConfig")?;
    let user = UserConfig::load().context("load user config")?;

    let store = SledStore::open_path(config.profile_path())
        .with_context(|| format!("open profile store at {}", config.profile_path().display()))?;
    let cues = SoundCues::new(Arc::new(LogCuePlayer), config.muted || cli.mute);
    let mut session = StudySession::new(ProfileStore::new(Arc::new(store)), cues);
    if session.resume().is_none() {
        if let Some(name) = user.username.as_deref() {
            if let Err(e) = session.login(name) {
                tracing::warn!(username = %name, error = %e, "configured username rejected");
            }
        }
    }

    tracing::debug!(storage_path = %config.storage_path, "rio started");

    match cli.command {
        Command::Login { username } => {
            let state = session.login(&username)?;
            println!("Bem-vindo(a), {}! {}", state.username, rank_line(state.level));
        }
        Command::Logout => {
            session.logout();
            println!("Sessão encerrada.");
        }
        Command::Status => print_status(&session)?,
        Command::Topic { action } => {
            let update = match action {
                TopicAction::Theory { topic_id } => session.toggle_theory(checked(&topic_id)?)?,
                TopicAction::Flashcards { topic_id } => session.toggle_flashcards(checked(&topic_id)?)?,
                TopicAction::Questions { topic_id, count } => {
                    session.set_questions_count(checked(&topic_id)?, count)?
                }
                TopicAction::Accuracy { topic_id, percent } => {
                    session.set_accuracy(checked(&topic_id)?, percent)?
                }
                TopicAction::Minutes { topic_id, minutes } => {
                    session.set_study_minutes(checked(&topic_id)?, minutes)?
                }
            };
            report(&update);
        }
        Command::Study { topic_id, minutes } => {
            let update = session.record_study_minutes(checked(&topic_id)?, minutes)?;
            report(&update);
        }
        Command::Submit { score } => {
            let update = session.record_submission(score)?;
            report(&update);
        }
        Command::Cycle { action } => match action {
            CycleAction::Set { subjects } => {
                session.set_study_cycle(subjects)?;
                println!("Ciclo atualizado.");
            }
            CycleAction::Next => match session.advance_cycle()? {
                Some(subject) => println!("Próxima matéria do ciclo: {}", subject),
                None => println!("Ciclo vazio. Use `rio cycle set <matérias...>`."),
            },
        },
        Command::Pomodoro(args) => timers::run_pomodoro(&mut session, &config, args).await?,
        Command::Focus(args) => timers::run_focus(&session, &config, args).await?,
        Command::Telex { action } => match action {
            TelexAction::Export => println!("{}", session.sync_code()?),
            TelexAction::Import { code } => {
                let state = session.apply_sync_code(&code)?;
                println!("Telex recebido: {} ({})", state.username, rank_line(state.level));
            }
        },
        Command::Backup { action } => match action {
            BackupAction::Export { out } => {
                let text = session.export_backup()?;
                let path = out.unwrap_or_else(|| {
                    PathBuf::from(sync_code::backup_file_name(Local::now().date_naive()))
                });
                std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
                println!("Backup salvo em {}", path.display());
            }
            BackupAction::Import { file } => {
                let text = std::fs::read_to_string(&file)
                    .with_context(|| format!("read {}", file.display()))?;
                let state = session.import_backup(&text)?;
                println!("Backup restaurado: {}", rank_line(state.level));
            }
        },
        Command::Mentor { action } => mentor::run(&mut session, &config, &user, action).await?,
        Command::Voice(args) => voice::run(&config, &user, args).await?,
        Command::Key { api_key } => {
            let mut updated = user.clone();
            updated.api_key = Some(api_key.trim().to_string());
            let path = UserConfig::default_path();
            updated.save_to_path(&path)?;
            println!("Chave salva em {}", path.display());
        }
    }

    Ok(())
}

/// Rejects ids that are not in the syllabus table.
fn checked(topic_id: &str) -> anyhow::Result<&str> {
    if syllabus::find(topic_id).is_none() {
        bail!("unknown syllabus topic: {}", topic_id);
    }
    Ok(topic_id)
}

fn rank_line(level: u32) -> String {
    let rank = rank_for(level);
    format!("{} {} · nível {}", rank.emoji, rank.title, level)
}

fn report(update: &ProgressUpdate) {
    if update.leveled_up() {
        println!("🎉 Promoção! {}", rank_line(update.level));
    }
    println!("XP {} · nível {}", update.xp, update.level);
    for id in &update.unlocked {
        if let Some(reward) = REWARDS.iter().find(|r| r.id == *id) {
            println!("🔓 Recompensa desbloqueada: {}", reward.name);
        }
    }
}

fn print_status(session: &StudySession) -> anyhow::Result<()> {
    let state = session
        .state()
        .ok_or_else(|| anyhow!("nenhum candidato logado; use `rio login <nome>`"))?;
    let stats = session.stats()?;

    println!("{} · {}", state.username, rank_line(state.level));
    println!(
        "XP {}/{} ({:.0}%) · {} redações",
        state.xp,
        state.level * 200,
        level_progress(state),
        state.submissions_count
    );
    println!(
        "{:.1} h estudadas · {}/{} tópicos lidos ({:.0}%) · {} questões",
        stats.total_hours(),
        stats.topics_read,
        stats.total_topics,
        stats.coverage_percent(),
        stats.questions_answered
    );
    if let Some(subject) = current_cycle_subject(state) {
        println!("Ciclo: {}", subject);
    }

    let missions = daily_missions(Local::now().weekday(), state);
    if missions.is_empty() {
        println!("Domingo: descanso.");
    }
    for mission in missions {
        match mission.next_topic {
            Some(item) => println!("• {}: {} ({})", mission.subject, item.topic, item.id),
            None => println!("• {}: edital concluído", mission.subject),
        }
    }
    Ok(())
}
