//! Mentor bridge: essay grading and study content from a generative model.
//!
//! [`MentorClient`] is the seam the rest of the crate talks to. [`MentorBridge`] speaks the
//! OpenAI-compatible chat-completions protocol with `reqwest`. Transport failures surface
//! as [`RioError::Remote`]; malformed or empty replies fall back to default values.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{RioConfig, UserConfig, DEFAULT_MENTOR_API_URL, DEFAULT_MENTOR_MODEL};
use crate::error::{RioError, RioResult};
use crate::prompts;
use crate::shared::{CorrectionResult, Dossier, DossierHighlight, DossierSource, PracticeQuestion};

pub const EXPLAIN_FALLBACK: &str = "Erro ao processar briefing.";
pub const SCHEDULE_FALLBACK: &str = "Erro ao gerar cronograma.";

#[async_trait]
pub trait MentorClient: Send + Sync {
    async fn grade_essay(&self, topic: &str, command: &str, essay: &str) -> RioResult<CorrectionResult>;
    async fn generate_question(&self, subject: &str) -> RioResult<PracticeQuestion>;
    async fn explain_subject(&self, subject: &str, subtopic: &str) -> RioResult<String>;
    async fn generate_schedule(&self, days_remaining: u32, context: &str) -> RioResult<String>;
    async fn weekly_dossier(&self, date: NaiveDate) -> RioResult<Dossier>;
}

// OpenAI-compatible request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

pub struct MentorBridge {
    api_key: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl MentorBridge {
    /// Bridge configured from `user_config.toml`, the environment and [`RioConfig`].
    /// Returns `None` when no API key is available.
    pub fn from_config(config: &RioConfig, user: &UserConfig) -> Option<Self> {
        let key = user.get_api_key()?;
        let model = user.get_llm_model().unwrap_or_else(|| config.mentor_model.clone());
        let base = user
            .get_llm_api_url()
            .unwrap_or_else(|| config.mentor_api_url.clone());
        Some(Self::new(key).with_model(&model).with_api_base(&base))
    }

    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            api_base: DEFAULT_MENTOR_API_URL.to_string(),
            model: DEFAULT_MENTOR_MODEL.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system: &str, user: String, json_mode: bool) -> RioResult<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: Some(0.4),
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(model = %self.model, json_mode, "mentor request");
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, "mentor request rejected");
            return Err(RioError::Remote(format!("mentor API error {}: {}", status, text)));
        }

        let data: ChatResponse = res.json().await?;
        Ok(data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl MentorClient for MentorBridge {
    async fn grade_essay(&self, topic: &str, command: &str, essay: &str) -> RioResult<CorrectionResult> {
        let raw = self
            .chat(
                prompts::GRADING_SYSTEM,
                prompts::grading_user_prompt(topic, command, essay),
                true,
            )
            .await?;
        Ok(parse_correction(&raw))
    }

    async fn generate_question(&self, subject: &str) -> RioResult<PracticeQuestion> {
        let raw = self
            .chat(prompts::QUESTION_SYSTEM, prompts::question_user_prompt(subject), true)
            .await?;
        Ok(parse_question(&raw, subject))
    }

    async fn explain_subject(&self, subject: &str, subtopic: &str) -> RioResult<String> {
        let raw = self
            .chat(
                prompts::EXPLAIN_SYSTEM,
                prompts::explain_user_prompt(subject, subtopic),
                false,
            )
            .await?;
        Ok(text_or(raw, EXPLAIN_FALLBACK))
    }

    async fn generate_schedule(&self, days_remaining: u32, context: &str) -> RioResult<String> {
        let raw = self
            .chat(
                prompts::SCHEDULE_SYSTEM,
                prompts::schedule_user_prompt(days_remaining, context),
                false,
            )
            .await?;
        Ok(text_or(raw, SCHEDULE_FALLBACK))
    }

    async fn weekly_dossier(&self, date: NaiveDate) -> RioResult<Dossier> {
        let today = date.format("%d/%m/%Y").to_string();
        let raw = self
            .chat(prompts::DOSSIER_SYSTEM, prompts::dossier_user_prompt(&today), true)
            .await?;
        Ok(parse_dossier(&raw))
    }
}

fn text_or(raw: String, fallback: &str) -> String {
    if raw.trim().is_empty() {
        fallback.to_string()
    } else {
        raw
    }
}

/// Pulls a JSON object out of a model reply: the whole reply, a fenced block, or the first
/// `{...}` span.
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        if v.is_object() {
            return Some(v);
        }
    }
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = body.find("```") {
            if let Ok(v) = serde_json::from_str::<Value>(body[..end].trim()) {
                if v.is_object() {
                    return Some(v);
                }
            }
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn str_field(v: &Value, key: &str) -> String {
    match v.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn num_field(v: &Value, key: &str) -> Option<f64> {
    match v.get(key)? {
        Value::Number(n) => n.as_f64(),
        // models sometimes answer "7,50"
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn list_field(v: &Value, key: &str) -> Vec<String> {
    match v.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| match i {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Clamped to 0.00–10.00 and rounded to two decimals.
pub fn clamp_score(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    (score.clamp(0.0, 10.0) * 100.0).round() / 100.0
}

pub fn parse_correction(raw: &str) -> CorrectionResult {
    let Some(v) = extract_json(raw) else {
        warn!("grading reply carried no JSON; returning empty correction");
        return CorrectionResult::default();
    };
    CorrectionResult {
        score: clamp_score(num_field(&v, "score").unwrap_or(0.0)),
        justification: str_field(&v, "justification"),
        errors: list_field(&v, "errors"),
        omissions: list_field(&v, "omissions"),
        highlights: list_field(&v, "highlights"),
        bank_grade: clamp_score(num_field(&v, "bankGrade").unwrap_or(0.0)),
        approved_grade: clamp_score(num_field(&v, "approvedGrade").unwrap_or(0.0)),
        model_response: str_field(&v, "modelResponse"),
        improvement_plan: list_field(&v, "improvementPlan"),
    }
}

/// Falls back to `subject` when the reply omits it.
pub fn parse_question(raw: &str, subject: &str) -> PracticeQuestion {
    let mut question = PracticeQuestion {
        subject: subject.to_string(),
        ..Default::default()
    };
    let Some(v) = extract_json(raw) else {
        warn!(subject = %subject, "question reply carried no JSON");
        return question;
    };
    let reported = str_field(&v, "subject");
    if !reported.trim().is_empty() {
        question.subject = reported;
    }
    question.topic = str_field(&v, "topic");
    question.command = str_field(&v, "command");
    if let Some(lines) = num_field(&v, "lines").filter(|l| *l >= 1.0) {
        question.lines = lines.round().min(f64::from(u32::MAX)) as u32;
    }
    question
}

/// Highlights without a URL inherit the source at the same index; sources are de-duplicated
/// by URI. A reply with no usable highlight yields [`Dossier::fallback`].
pub fn parse_dossier(raw: &str) -> Dossier {
    let Some(v) = extract_json(raw) else {
        warn!("dossier reply carried no JSON; using built-in headlines");
        return Dossier::fallback();
    };

    let sources: Vec<DossierSource> = match v.get("sources") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|s| {
                let title = str_field(s, "title");
                let uri = str_field(s, "uri");
                (!title.is_empty() && !uri.is_empty()).then_some(DossierSource { title, uri })
            })
            .collect(),
        _ => Vec::new(),
    };

    let highlights: Vec<DossierHighlight> = match v.get("highlights") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|h| {
                let text = match h {
                    Value::String(s) => s.clone(),
                    _ => str_field(h, "text"),
                };
                if text.trim().is_empty() {
                    return None;
                }
                let url = Some(str_field(h, "url")).filter(|u| !u.is_empty());
                Some(DossierHighlight { text, url })
            })
            .enumerate()
            .map(|(idx, mut h)| {
                if h.url.is_none() {
                    h.url = sources.get(idx).map(|s| s.uri.clone());
                }
                h
            })
            .collect(),
        _ => Vec::new(),
    };

    if highlights.is_empty() {
        return Dossier::fallback();
    }

    let mut seen = HashSet::new();
    let sources = sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect();

    Dossier {
        current: str_field(&v, "current"),
        previous: str_field(&v, "previous"),
        highlights,
        sources,
    }
}
