use super::{AgentConfig, FetchConfig, ObservabilityConfig, SearchConfig};
use crate::error::ConfigError;
use crate::prompt::TeraEngine;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.2;
const REDACTED: &str = "***";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - set on load, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint root, e.g. `http://localhost:8000/v1`.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_provider_retries")]
    pub max_retries: u32,
    #[serde(default = "default_provider_backoff_ms")]
    pub base_backoff_ms: u64,
}

fn default_provider_retries() -> u32 {
    2
}

fn default_provider_backoff_ms() -> u64 {
    500
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_provider_retries(),
            base_backoff_ms: default_provider_backoff_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: default_config_dir().join("config.toml"),
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
            base_url: None,
            agent: AgentConfig::default(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            reliability: ReliabilityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    UserDirs::new()
        .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf())
        .join(".enricher")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load `~/.enricher/config.toml`, writing defaults on first use.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let enricher_dir = home.join(".enricher");
        let config_path = enricher_dir.join("config.toml");

        if !enricher_dir.exists() {
            fs::create_dir_all(&enricher_dir).context("Failed to create .enricher directory")?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Load from an explicit file. Missing sections and keys take defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::Io)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(e.to_string()))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = non_empty(lookup("ENRICHER_API_KEY"))
            .or_else(|| non_empty(lookup("OPENAI_API_KEY")))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = non_empty(lookup("ENRICHER_MODEL")) {
            self.model = model;
        }

        if let Some(base_url) = non_empty(lookup("ENRICHER_BASE_URL")) {
            self.base_url = Some(base_url);
        }

        if let Some(key) = non_empty(lookup("TAVILY_API_KEY")) {
            self.search.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.agent.max_loops == 0 {
            return Err(ConfigError::Validation(
                "agent.max_loops must be > 0".into(),
            ));
        }
        if self.agent.max_concurrent_actions == 0 {
            return Err(ConfigError::Validation(
                "agent.max_concurrent_actions must be > 0".into(),
            ));
        }
        for (field, template) in [
            ("agent.prompt_template", &self.agent.prompt_template),
            ("agent.judgment_template", &self.agent.judgment_template),
        ] {
            if let Some(template) = template {
                TeraEngine::check_template(template)
                    .map_err(|e| ConfigError::Validation(format!("{field}: {e}")))?;
            }
        }
        Ok(())
    }

    /// Copy suitable for display, with credentials masked.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some(REDACTED.into());
        }
        if shown.search.api_key.is_some() {
            shown.search.api_key = Some(REDACTED.into());
        }
        shown
    }
}
