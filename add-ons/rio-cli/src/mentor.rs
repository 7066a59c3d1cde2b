//! Mentor commands: essay grading and generated study material.

use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use rio_core::{
    days_until, schedule_context, MentorBridge, MentorClient, RioConfig, StudySession, UserConfig,
};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum MentorAction {
    /// Grade an essay and record the submission
    Grade {
        /// Question topic
        #[arg(long)]
        topic: String,
        /// Question command
        #[arg(long)]
        command: String,
        /// Essay text file
        essay: PathBuf,
    },
    /// Generate a discursive practice question
    Question { subject: String },
    /// Briefing on a subject and subtopic
    Explain { subject: String, subtopic: String },
    /// Study schedule until the exam date
    Schedule {
        /// Exam date, YYYY-MM-DD
        #[arg(long)]
        exam_date: NaiveDate,
    },
    /// This week's international-affairs dossier
    Dossier,
}

pub async fn run(
    session: &mut StudySession,
    config: &RioConfig,
    user: &UserConfig,
    action: MentorAction,
) -> anyhow::Result<()> {
    let bridge = MentorBridge::from_config(config, user)
        .ok_or_else(|| anyhow!("no API key configured; set GEMINI_API_KEY or run `rio key <chave>`"))?;
    tracing::debug!(model = %bridge.model(), "mentor ready");
    let today = Local::now().date_naive();

    match action {
        MentorAction::Grade { topic, command, essay } => {
            let text = std::fs::read_to_string(&essay)
                .with_context(|| format!("read {}", essay.display()))?;
            let result = bridge.grade_essay(&topic, &command, &text).await?;

            println!("Nota: {:.2}", result.score);
            println!("Nota PG (banca): {:.2} · Média aprovados: {:.2}", result.bank_grade, result.approved_grade);
            println!("\n{}", result.justification);
            print_list("Erros", &result.errors);
            print_list("Omissões", &result.omissions);
            print_list("Destaques", &result.highlights);
            print_list("Plano de melhoria", &result.improvement_plan);
            if !result.model_response.is_empty() {
                println!("\nResposta modelo:\n{}", result.model_response);
            }

            if session.state().is_some() {
                let update = session.record_submission(Some(result.score))?;
                println!("\nRedação registrada · XP {} · nível {}", update.xp, update.level);
            }
        }
        MentorAction::Question { subject } => {
            let question = bridge.generate_question(&subject).await?;
            println!("{} · {}", question.subject, question.topic);
            println!("\n{}", question.command);
            println!("\n({} linhas)", question.lines);
        }
        MentorAction::Explain { subject, subtopic } => {
            println!("{}", bridge.explain_subject(&subject, &subtopic).await?);
        }
        MentorAction::Schedule { exam_date } => {
            let state = session
                .state()
                .ok_or_else(|| anyhow!("nenhum candidato logado; use `rio login <nome>`"))?;
            let days = days_until(exam_date, today);
            let context = schedule_context(state);
            println!("{}", bridge.generate_schedule(days, &context).await?);
        }
        MentorAction::Dossier => {
            let dossier = bridge.weekly_dossier(today).await?;
            println!("Semana atual: {}\nSemana anterior: {}\n", dossier.current, dossier.previous);
            for highlight in &dossier.highlights {
                match &highlight.url {
                    Some(url) => println!("• {} <{}>", highlight.text, url),
                    None => println!("• {}", highlight.text),
                }
            }
            if !dossier.sources.is_empty() {
                println!("\nFontes:");
                for source in &dossier.sources {
                    println!("- {} <{}>", source.title, source.uri);
                }
            }
        }
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("• {}", item);
    }
}
