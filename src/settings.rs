//! Application settings storage
//!
//! Stores configuration like the API key and model names in a JSON file in
//! the user's config directory. Built once at startup and never mutated while
//! a session runs.

use crate::error::{LabError, LabResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the completion-service key
pub const API_KEY_ENV: &str = "AIML_API_KEY";

pub const DEFAULT_API_BASE_URL: &str = "https://api.aimlapi.com";
pub const DEFAULT_ARXIV_BASE_URL: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REASONING_MODEL: &str = "o1-mini";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Cheap model used for PDF summaries
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Expensive model used for experiment generation
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,
    #[serde(default = "default_arxiv_base_url")]
    pub arxiv_base_url: String,
    /// HTTP timeout for every outbound request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How much of each abstract the search panel shows
    #[serde(default = "default_summary_preview")]
    pub summary_preview_chars: usize,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_fast_model() -> String {
    DEFAULT_FAST_MODEL.to_string()
}

fn default_reasoning_model() -> String {
    DEFAULT_REASONING_MODEL.to_string()
}

fn default_arxiv_base_url() -> String {
    DEFAULT_ARXIV_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    120 // reasoning models can take a while
}

fn default_summary_preview() -> usize {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            fast_model: default_fast_model(),
            reasoning_model: default_reasoning_model(),
            arxiv_base_url: default_arxiv_base_url(),
            request_timeout_secs: default_request_timeout(),
            summary_preview_chars: default_summary_preview(),
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/reasoning-lab/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("reasoning-lab"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }

    /// Load settings from disk or create default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable settings file");
                    Settings::default()
                }),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> LabResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LabError::Config(format!("Failed to serialize settings: {}", e)))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key (env var first, then stored setting)
    pub fn resolve_api_key(&self) -> LabResult<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_value: Option<String>) -> LabResult<String> {
        env_value
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
            .ok_or_else(|| LabError::Config(format!("{} not set", API_KEY_ENV)))
    }

    /// Masked API key for display, if one is available
    pub fn masked_api_key(&self) -> Option<String> {
        self.resolve_api_key().ok().map(|k| mask_key(&k))
    }
}

/// Shows first 8 / last 4 chars of long keys, stars otherwise
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

// ==================== Model configurations ====================

/// Logical role a model plays in the lab
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelRole {
    Fast,
    DeepReasoning,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Fast => "fast",
            ModelRole::DeepReasoning => "deep-reasoning",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model bound to a key and endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub name: String,
    pub api_key: String,
    pub api_base_url: String,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("api_key", &mask_key(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Role -> model mapping handed to the completion backend
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    configs: BTreeMap<ModelRole, ModelConfig>,
}

impl ModelRegistry {
    pub fn new(configs: impl IntoIterator<Item = (ModelRole, ModelConfig)>) -> Self {
        Self { configs: configs.into_iter().collect() }
    }

    /// Build both configurations from settings; fails when no key is available.
    pub fn from_settings(settings: &Settings) -> LabResult<Self> {
        let api_key = settings.resolve_api_key()?;
        Ok(Self::with_key(settings, api_key))
    }

    /// Bind both roles to an explicit key (may be empty for display)
    pub fn with_key(settings: &Settings, api_key: String) -> Self {
        let model = |name: &str| ModelConfig {
            name: name.to_string(),
            api_key: api_key.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        };
        Self::new([
            (ModelRole::Fast, model(&settings.fast_model)),
            (ModelRole::DeepReasoning, model(&settings.reasoning_model)),
        ])
    }

    pub fn get(&self, role: ModelRole) -> LabResult<&ModelConfig> {
        self.configs
            .get(&role)
            .ok_or_else(|| LabError::Config(format!("no model configured for role '{}'", role)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelRole, &ModelConfig)> {
        self.configs.iter()
    }

    /// `(role, model name)` pairs in role order, for `config show`
    pub fn model_listing(&self) -> Vec<(&'static str, String)> {
        self.iter().map(|(role, config)| (role.as_str(), config.name.clone())).collect()
    }
}
