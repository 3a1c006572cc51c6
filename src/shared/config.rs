//! Application configuration. Storage location and AI categorization settings.

use crate::usecases::ClassifierConfig;
use serde::Deserialize;
use std::time::Duration;

/// Default deadline for one categorization call.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 5;
/// Default sampling temperature; low to keep categorization stable.
pub const DEFAULT_AI_TEMPERATURE: f32 = 0.2;

/// Backing store for expenses and milestones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding sitebook.db. Read from SITEBOOK_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// `sqlite` (default) or `memory`. Read from SITEBOOK_STORAGE.
    #[serde(default)]
    pub storage: Option<StorageKind>,

    /// Project opened by the terminal front end. Read from SITEBOOK_PROJECT_ID.
    #[serde(default)]
    pub project_id: Option<i64>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Categorization Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key (e.g., OpenAI). Read from SITEBOOK_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from SITEBOOK_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from SITEBOOK_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Sampling temperature. Read from SITEBOOK_AI_TEMPERATURE.
    #[serde(default)]
    pub ai_temperature: Option<f32>,

    /// Per-call deadline in seconds. Read from SITEBOOK_AI_TIMEOUT_SECS.
    #[serde(default)]
    pub ai_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("SITEBOOK_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment overrides the file.
        c = c.add_source(config::Environment::with_prefix("SITEBOOK").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn storage_or_default(&self) -> StorageKind {
        self.storage.unwrap_or_default()
    }

    pub fn project_id_or_default(&self) -> i64 {
        self.project_id.unwrap_or(1)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured and non-empty.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Temperature clamped to the [0, 2] range accepted by OpenAI-compatible APIs.
    pub fn ai_temperature_or_default(&self) -> f32 {
        self.ai_temperature
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 2.0))
            .unwrap_or(DEFAULT_AI_TEMPERATURE)
    }

    /// Returns the per-call timeout. Zero is treated as unset.
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(
            self.ai_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
        )
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            temperature: self.ai_temperature_or_default(),
            timeout: self.ai_timeout(),
        }
    }
}
