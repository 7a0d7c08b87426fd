//! TOML-based application configuration.
//!
//! Stores:
//! - Quiz timing and default category/difficulty
//! - Starting power-up inventory
//! - Question provider endpoint, model and timeout
//! - Optional achievement rule overrides
//!
//! Configuration is stored at `~/.config/quizarena/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::achievements::{AchievementEngine, AchievementRule};
use crate::error::ConfigError;
use crate::lifecycle::LifecycleConfig;
use crate::question::Difficulty;
use crate::scoring::ScoringRules;
use crate::session::PowerUps;

/// Returns `~/.config/quizarena[-dev]/` based on QUIZARENA_ENV.
///
/// Set QUIZARENA_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUIZARENA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quizarena-dev")
    } else {
        base_dir.join("quizarena")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Quiz timing and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,
    #[serde(default = "default_freeze_extension_secs")]
    pub freeze_extension_secs: u64,
    /// Streak multiple that earns a bonus hint.
    #[serde(default = "default_hint_bonus_interval")]
    pub hint_bonus_interval: u32,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default)]
    pub default_difficulty: Difficulty,
}

/// Chat-completions endpoint used to generate questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementsConfig {
    /// Replaces the built-in rule table when non-empty.
    #[serde(default)]
    pub rules: Vec<AchievementRule>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/quizarena/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub power_ups: PowerUps,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub achievements: AchievementsConfig,
}

// Default functions
fn default_time_limit_secs() -> u64 {
    20
}
fn default_freeze_extension_secs() -> u64 {
    10
}
fn default_hint_bonus_interval() -> u32 {
    3
}
fn default_category() -> String {
    "General Knowledge".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".into()
}
fn default_model() -> String {
    "llama3-70b-8192".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    15
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: default_time_limit_secs(),
            freeze_extension_secs: default_freeze_extension_secs(),
            hint_bonus_interval: default_hint_bonus_interval(),
            default_category: default_category(),
            default_difficulty: Difficulty::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path` or create it with defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Config::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            time_limit: Duration::from_secs(self.quiz.time_limit_secs),
            freeze_extension: Duration::from_secs(self.quiz.freeze_extension_secs),
            scoring: ScoringRules {
                hint_bonus_interval: self.quiz.hint_bonus_interval,
            },
        }
    }

    pub fn achievement_engine(&self) -> AchievementEngine {
        if self.achievements.rules.is_empty() {
            AchievementEngine::default()
        } else {
            AchievementEngine::new(self.achievements.rules.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::Criterion;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.quiz.time_limit_secs, 20);
        assert_eq!(parsed.power_ups, PowerUps { hint: 3, freeze: 1, double: 1 });
        assert_eq!(parsed.provider.model, "llama3-70b-8192");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[quiz]\ntime_limit_secs = 30\n").unwrap();
        assert_eq!(parsed.quiz.time_limit_secs, 30);
        assert_eq!(parsed.quiz.default_category, "General Knowledge");
        assert_eq!(parsed.provider.timeout_secs, 15);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("quiz.time_limit_secs").as_deref(), Some("20"));
        assert_eq!(cfg.get("quiz.default_difficulty").as_deref(), Some("medium"));
        assert_eq!(cfg.get("power_ups.hint").as_deref(), Some("3"));
        assert!(cfg.get("quiz.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("quiz.time_limit_secs", "45").unwrap();
        cfg.set("provider.temperature", "0.2").unwrap();
        cfg.set("quiz.default_difficulty", "hard").unwrap();
        assert_eq!(cfg.quiz.time_limit_secs, 45);
        assert_eq!(cfg.provider.temperature, 0.2);
        assert_eq!(cfg.quiz.default_difficulty, Difficulty::Hard);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("quiz.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("quiz.time_limit_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("quiz.default_difficulty", "extreme").is_err());
        assert_eq!(cfg.quiz.default_difficulty, Difficulty::Medium);
    }

    #[test]
    fn load_from_creates_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.quiz.time_limit_secs, 20);

        let mut changed = cfg.clone();
        changed.set("power_ups.freeze", "4").unwrap();
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.power_ups.freeze, 4);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "quiz = 5").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn lifecycle_config_mirrors_quiz_section() {
        let mut cfg = Config::default();
        cfg.quiz.hint_bonus_interval = 4;
        let lc = cfg.lifecycle();
        assert_eq!(lc.time_limit, Duration::from_secs(20));
        assert_eq!(lc.freeze_extension, Duration::from_secs(10));
        assert_eq!(lc.scoring.hint_bonus_interval, 4);
    }

    #[test]
    fn achievement_rules_override_from_toml() {
        let toml_str = r#"
            [[achievements.rules]]
            badge = "marathon"
            criterion = { kind = "correct_at_least", count = 25 }
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        let engine = cfg.achievement_engine();
        assert_eq!(engine.rules().len(), 1);
        assert_eq!(engine.rules()[0].criterion, Criterion::CorrectAtLeast { count: 25 });

        assert_eq!(Config::default().achievement_engine().rules().len(), 7);
    }
}
