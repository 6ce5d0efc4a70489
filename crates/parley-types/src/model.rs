//! Model catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability tag for models whose completions are images, not text.
pub const CAPABILITY_IMAGE_OUTPUT: &str = "image_output";

/// A catalog entry describing one model the inference gateway can serve.
///
/// Immutable from the pipeline's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModel {
    pub id: Uuid,
    /// Name the gateway understands (e.g. "llama3.3-70b").
    pub system_name: String,
    pub display_name: String,
    /// Ordered provider ids the gateway may route to.
    pub providers: Vec<String>,
    pub premium: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AiModel {
    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c == tag)
    }
}

/// Request to add a model to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewModel {
    pub system_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub providers: Vec<String>,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
}
