//! Application configuration and the per-user key file.
//!
//! [`RioConfig`] is layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `RIO__*` environment variables. [`UserConfig`] is the small `user_config.toml`
//! that holds the personal API key.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RioError, RioResult};
use crate::timer::PomodoroConfig;

pub const DEFAULT_MENTOR_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MENTOR_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";
pub const DEFAULT_LIVE_MODEL: &str = "models/gemini-2.5-flash-native-audio-preview-09-2025";
pub const DEFAULT_VOICE: &str = "Kore";

/// Global application configuration.
///
/// | Key | Env | Default |
/// |-----|-----|---------|
/// | storage_path | RIO__STORAGE_PATH | ./data |
/// | app_name | RIO__APP_NAME | Iniciativa Diplomata |
/// | mentor_model | RIO__MENTOR_MODEL | gemini-2.5-flash |
/// | mentor_api_url | RIO__MENTOR_API_URL | Gemini OpenAI-compatible endpoint |
/// | live_url | RIO__LIVE_URL | Gemini Live websocket |
/// | live_model | RIO__LIVE_MODEL | native-audio preview model |
/// | voice_name | RIO__VOICE_NAME | Kore |
/// | muted | RIO__MUTED | false |
/// | work_minutes / break_minutes | RIO__WORK_MINUTES / RIO__BREAK_MINUTES | 25 / 5 |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RioConfig {
    pub storage_path: String,
    pub app_name: String,
    pub mentor_model: String,
    pub mentor_api_url: String,
    pub live_url: String,
    pub live_model: String,
    pub voice_name: String,
    #[serde(default)]
    pub muted: bool,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for RioConfig {
    fn default() -> Self {
        Self {
            storage_path: "./data".to_string(),
            app_name: "Iniciativa Diplomata".to_string(),
            mentor_model: DEFAULT_MENTOR_MODEL.to_string(),
            mentor_api_url: DEFAULT_MENTOR_API_URL.to_string(),
            live_url: DEFAULT_LIVE_URL.to_string(),
            live_model: DEFAULT_LIVE_MODEL.to_string(),
            voice_name: DEFAULT_VOICE.to_string(),
            muted: false,
            work_minutes: 25,
            break_minutes: 5,
        }
    }
}

impl RioConfig {
    /// Load config from file and environment. Precedence: env > `RIO_CONFIG` path or
    /// `config/rio.toml` > defaults.
    pub fn load() -> RioResult<Self> {
        let config_path = std::env::var("RIO_CONFIG").unwrap_or_else(|_| "config/rio.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> RioResult<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("storage_path", defaults.storage_path)?
            .set_default("app_name", defaults.app_name)?
            .set_default("mentor_model", defaults.mentor_model)?
            .set_default("mentor_api_url", defaults.mentor_api_url)?
            .set_default("live_url", defaults.live_url)?
            .set_default("live_model", defaults.live_model)?
            .set_default("voice_name", defaults.voice_name)?
            .set_default("muted", defaults.muted)?
            .set_default("work_minutes", i64::from(defaults.work_minutes))?
            .set_default("break_minutes", i64::from(defaults.break_minutes))?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("RIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Directory of the sled profile store.
    pub fn profile_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("rio_profiles")
    }

    pub fn pomodoro(&self) -> PomodoroConfig {
        PomodoroConfig {
            work_minutes: self.work_minutes.max(1),
            break_minutes: self.break_minutes.max(1),
        }
    }
}

/// Personal settings stored in `user_config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Personal key for the generative endpoints.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub llm_model: Option<String>,

    #[serde(default)]
    pub llm_api_url: Option<String>,

    /// Username to resume when no current-user pointer is stored.
    #[serde(default)]
    pub username: Option<String>,
}

impl UserConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("user_config.toml")
    }

    pub fn load() -> RioResult<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Reads the file; a missing file yields defaults without creating it.
    pub fn load_from_path(path: &Path) -> RioResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RioError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save_to_path(&self, path: &Path) -> RioResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RioError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Priority: file > RIO_LLM_API_KEY > GEMINI_API_KEY.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_opt_string("RIO_LLM_API_KEY"))
            .or_else(|| env_opt_string("GEMINI_API_KEY"))
    }

    pub fn get_llm_model(&self) -> Option<String> {
        self.llm_model
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_opt_string("RIO_LLM_MODEL"))
    }

    pub fn get_llm_api_url(&self) -> Option<String> {
        self.llm_api_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_opt_string("RIO_LLM_API_URL"))
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let cfg = RioConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.work_minutes, 25);
        assert_eq!(cfg.break_minutes, 5);
        assert_eq!(cfg.voice_name, "Kore");
        assert!(cfg.profile_path().ends_with("rio_profiles"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rio.toml");
        fs::write(&path, "work_minutes = 50\nmuted = true\nvoice_name = \"Puck\"\n").unwrap();
        let cfg = RioConfig::load_from(&path).unwrap();
        assert_eq!(cfg.work_minutes, 50);
        assert!(cfg.muted);
        assert_eq!(cfg.voice_name, "Puck");
        assert_eq!(cfg.pomodoro().break_minutes, 5);
    }

    #[test]
    fn test_user_config_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("user_config.toml");
        assert!(UserConfig::load_from_path(&path).unwrap().api_key.is_none());

        let cfg = UserConfig {
            api_key: Some("key-123".into()),
            username: Some("ana".into()),
            ..Default::default()
        };
        cfg.save_to_path(&path).unwrap();
        let loaded = UserConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.get_api_key().as_deref(), Some("key-123"));
        assert_eq!(loaded.username.as_deref(), Some("ana"));
    }
}
