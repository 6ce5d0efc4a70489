//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` that points the
//! service at its remote collaborators and sets signup balances, shortcut
//! limits and analytics delivery.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level configuration for the Parley service.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub shortcuts: ShortcutConfig,
}

/// Remote model-serving gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_url")]
    pub base_url: String,

    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,

    /// Model used for chat title generation.
    #[serde(default = "default_title_model")]
    pub title_model: String,

    #[serde(default = "default_title_providers")]
    pub title_providers: Vec<String>,
}

fn default_inference_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_inference_timeout() -> u64 {
    60
}

fn default_title_model() -> String {
    "llama3.3-70b".to_string()
}

fn default_title_providers() -> Vec<String> {
    vec!["cerebras".to_string()]
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_url(),
            timeout_secs: default_inference_timeout(),
            title_model: default_title_model(),
            title_providers: default_title_providers(),
        }
    }
}

/// OCR and file recognition service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_enrichment_url")]
    pub base_url: String,

    #[serde(default = "default_enrichment_timeout")]
    pub timeout_secs: u64,
}

fn default_enrichment_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_enrichment_timeout() -> u64 {
    30
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: default_enrichment_url(),
            timeout_secs: default_enrichment_timeout(),
        }
    }
}

/// Usage analytics delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_analytics_endpoint")]
    pub endpoint: String,

    /// Project API key. Prefer `PARLEY_ANALYTICS_KEY` over writing it here.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_analytics_timeout")]
    pub timeout_secs: u64,

    /// Events buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_analytics_endpoint() -> String {
    "https://us.i.posthog.com".to_string()
}

fn default_analytics_timeout() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_analytics_endpoint(),
            api_key: None,
            timeout_secs: default_analytics_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Balances granted at signup and the model new users start on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_free_questions")]
    pub signup_free_questions: u32,

    #[serde(default)]
    pub signup_premium_questions: u32,

    /// Catalog id assigned to new users. When unset, the first non-premium
    /// model in the catalog is used.
    #[serde(default)]
    pub default_model_id: Option<Uuid>,
}

fn default_free_questions() -> u32 {
    25
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            signup_free_questions: default_free_questions(),
            signup_premium_questions: 0,
            default_model_id: None,
        }
    }
}

/// Shortcut registration rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutConfig {
    /// System commands that can never be registered as shortcuts.
    #[serde(default = "default_reserved_commands")]
    pub reserved_commands: Vec<String>,

    #[serde(default = "default_max_instruction_chars")]
    pub max_instruction_chars: usize,
}

fn default_reserved_commands() -> Vec<String> {
    ["/start", "/chats", "/roles"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_instruction_chars() -> usize {
    2000
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            reserved_commands: default_reserved_commands(),
            max_instruction_chars: default_max_instruction_chars(),
        }
    }
}
