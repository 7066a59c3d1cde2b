//! Pomodoro and deep-focus commands.

use anyhow::bail;
use clap::Args;
use rio_core::timer::{drive, format_clock, Pomodoro, TimerEvent, TimerMode, TimerState};
use rio_core::{RioConfig, StudySession};
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Args, Debug)]
pub struct PomodoroArgs {
    /// Syllabus topic the work minutes are credited to
    pub topic_id: String,

    /// Work interval length in minutes
    #[arg(long)]
    pub work: Option<u32>,

    /// Break length in minutes
    #[arg(long = "break")]
    pub break_minutes: Option<u32>,

    /// Run the break right after the work interval
    #[arg(long)]
    pub with_break: bool,

    /// Do not credit the finished interval
    #[arg(long)]
    pub dismiss: bool,
}

#[derive(Args, Debug)]
pub struct FocusArgs {
    /// Topic in focus
    pub topic_id: String,

    /// Countdown length in minutes (defaults to the pomodoro work length)
    #[arg(long)]
    pub minutes: Option<u32>,
}

/// Renders timer events on one terminal line until the sender goes away.
fn spawn_renderer(mut events: mpsc::UnboundedReceiver<TimerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                TimerEvent::Started { mode, remaining_secs } => {
                    println!("▶ {} {}", mode_label(mode), format_clock(remaining_secs));
                }
                TimerEvent::Tick { remaining_secs } => {
                    print!("\r⏱ {} ", format_clock(remaining_secs));
                    let _ = std::io::stdout().flush();
                }
                TimerEvent::Completed { mode } => println!("\n✔ {} concluído", mode_label(mode)),
                TimerEvent::ModeChanged { mode } => println!("Próximo: {}", mode_label(mode)),
                TimerEvent::Exited { completed } if !completed => println!("\nFoco encerrado."),
                _ => {}
            }
        }
    })
}

fn mode_label(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Work => "Foco",
        TimerMode::Break => "Pausa",
    }
}

pub async fn run_pomodoro(
    session: &mut StudySession,
    config: &RioConfig,
    args: PomodoroArgs,
) -> anyhow::Result<()> {
    if session.state().is_none() {
        bail!("nenhum candidato logado; use `rio login <nome>`");
    }

    let (mut pomodoro, events) = Pomodoro::new(config.pomodoro(), session.cues().clone());
    if let Some(work) = args.work {
        let delta = i64::from(work) - i64::from(pomodoro.work_minutes());
        pomodoro.adjust(TimerMode::Work, i32::try_from(delta)?)?;
    }
    if let Some(minutes) = args.break_minutes {
        let delta = i64::from(minutes) - i64::from(pomodoro.break_minutes());
        pomodoro.adjust(TimerMode::Break, i32::try_from(delta)?)?;
    }
    pomodoro.select_topic(Some(args.topic_id))?;
    let renderer = spawn_renderer(events);

    pomodoro.start()?;
    let finished = tokio::select! {
        state = drive(&mut pomodoro) => state == TimerState::Completed,
        _ = tokio::signal::ctrl_c() => false,
    };
    if !finished {
        pomodoro.reset();
        tracing::info!("pomodoro interrupted; nothing credited");
    } else if args.dismiss {
        pomodoro.dismiss_commit();
    } else if let Some(commit) = pomodoro.confirm_commit() {
        let update = session.commit_study(&commit)?;
        println!(
            "{} min creditados em {} · XP {} · nível {}",
            commit.minutes, commit.topic_id, update.xp, update.level
        );
    }

    if finished && args.with_break {
        pomodoro.start()?;
        tokio::select! {
            _ = drive(&mut pomodoro) => {}
            _ = tokio::signal::ctrl_c() => pomodoro.reset(),
        }
    }

    drop(pomodoro);
    renderer.await?;
    Ok(())
}

pub async fn run_focus(session: &StudySession, config: &RioConfig, args: FocusArgs) -> anyhow::Result<()> {
    let (mut pomodoro, _pomodoro_events) = Pomodoro::new(config.pomodoro(), session.cues().clone());
    if let Some(minutes) = args.minutes {
        let delta = i64::from(minutes) - i64::from(pomodoro.work_minutes());
        pomodoro.adjust(TimerMode::Work, i32::try_from(delta)?)?;
    }
    pomodoro.select_topic(Some(args.topic_id))?;

    let (mut focus, events) = pomodoro.deep_focus()?;
    let renderer = spawn_renderer(events);
    tokio::select! {
        _ = drive(&mut focus) => {}
        _ = tokio::signal::ctrl_c() => focus.exit(),
    }

    drop(focus);
    renderer.await?;
    Ok(())
}
