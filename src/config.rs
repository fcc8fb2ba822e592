use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::llm::ApiKeySource;
use crate::llm::provider::API_KEY_ENV;
use crate::tutor::ContextOptions;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const CONFIG_DIR_NAME: &str = "tutorai";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub file_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub context: ContextOptions,
    pub theme: ThemePreset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "high-contrast" => Ok(Self::HighContrast),
            _ => Err(format!("unknown preset '{value}'")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    context: Option<RawContextConfig>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContextConfig {
    window: Option<i64>,
    full_history: Option<bool>,
    summary_chars: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(explicit: Option<&Path>) -> Result<Self> {
        let (config_path, file_config) = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                (path.to_path_buf(), load_file_config(path)?)
            }
            None => {
                let path = discover_config_path()?;
                let file_config = if path.is_file() {
                    load_file_config(&path)?
                } else {
                    RawFileConfig::default()
                };
                (path, file_config)
            }
        };

        dotenvy::dotenv().ok();

        let context = validate_context(file_config.context.as_ref(), &config_path)?;
        let theme = match file_config.theme.as_ref().and_then(|t| t.name.as_deref()) {
            Some(name) => ThemePreset::from_str(name)
                .map_err(|reason| config_error(&config_path, "theme.name", &reason))?,
            None => ThemePreset::default(),
        };

        Ok(Self {
            file_api_key: file_config.gemini_api_key.as_deref().and_then(non_empty),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or_else(|| file_config.gemini_model.as_deref().and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or_else(|| file_config.gemini_base_url.as_deref().and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            config_path,
            context,
            theme,
        })
    }

    /// The environment wins; the config file key is only used when the variable is unset.
    pub fn api_key_source(&self) -> ApiKeySource {
        match &self.file_api_key {
            Some(key) if env_non_empty(API_KEY_ENV).is_none() => ApiKeySource::Fixed(key.clone()),
            _ => ApiKeySource::from_env(),
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<RawFileConfig> {
    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_context(raw: Option<&RawContextConfig>, config_path: &Path) -> Result<ContextOptions> {
    let Some(raw) = raw else {
        return Ok(ContextOptions::default());
    };

    let window = positive(raw.window, config_path, "context.window")?;
    let summary_chars = positive(raw.summary_chars, config_path, "context.summary_chars")?;

    if raw.full_history.unwrap_or(false) {
        if window.is_some() {
            return Err(config_error(
                config_path,
                "context.window",
                "cannot be combined with full_history = true",
            ));
        }
        return Ok(ContextOptions {
            window: None,
            summary_chars: summary_chars.or(Some(ContextOptions::FORM_SUMMARY_CHARS)),
        });
    }

    Ok(ContextOptions {
        window: Some(window.unwrap_or(ContextOptions::DEFAULT_WINDOW)),
        summary_chars,
    })
}

fn positive(value: Option<i64>, config_path: &Path, key_path: &str) -> Result<Option<usize>> {
    match value {
        None => Ok(None),
        Some(v) if v >= 1 => usize::try_from(v)
            .map(Some)
            .map_err(|_| config_error(config_path, key_path, "value is too large")),
        Some(_) => Err(config_error(config_path, key_path, "must be >= 1")),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().as_deref().and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
