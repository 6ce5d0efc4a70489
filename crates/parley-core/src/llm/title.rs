//! Chat title generation via the inference gateway.
//!
//! `TitleGenerator` names a new chat from the user's first effective prompt.
//! The call is tagged with the system caller identity and is never billed.

use std::sync::Arc;

use parley_types::chat::FALLBACK_CHAT_TITLE;
use parley_types::llm::{InferenceError, InferenceRequest, ModelTarget, SYSTEM_CALLER, Turn};

use super::box_gateway::BoxInferenceGateway;

/// Instructions for the title call. The user's prompt is appended.
const TITLE_INSTRUCTIONS: &str = r#"You are a helpful assistant whose job is to generate concise, descriptive chat titles based on the user's first message.

Instructions:
- Detect the language of the user's message automatically.
- Write the chat title in the same language.
- Keep the title to a maximum of 5 words (ideally 3-4 words).
- Capture the essence of the message; be clear and descriptive.
- Provide only the title, no explanation and no extra formatting.

Examples:
User says (English): "Can you help me plan a week-long trip to Japan with budget-friendly options?"
Title: "Budget Japan Trip"

User says (Spanish): "Necesito un resumen rápido de este artículo sobre cambio climático"
Title: "Resumen Cambio Climático""#;

/// Generates chat titles with a fixed, configured model.
#[derive(Debug, Clone)]
pub struct TitleGenerator {
    gateway: Arc<BoxInferenceGateway>,
    model: ModelTarget,
}

impl TitleGenerator {
    pub fn new(gateway: Arc<BoxInferenceGateway>, model: ModelTarget) -> Self {
        Self { gateway, model }
    }

    /// The system-only request sent for `prompt`.
    pub fn request_for(&self, prompt: &str) -> InferenceRequest {
        InferenceRequest {
            conversation: vec![Turn::system(format!(
                "{TITLE_INSTRUCTIONS}\n\nNow, user says: \"{prompt}\""
            ))],
            model: self.model.clone(),
            agent_mode: false,
            caller: SYSTEM_CALLER.to_string(),
        }
    }

    /// Ask the gateway for a 3-5 word title in the prompt's language.
    ///
    /// Surrounding whitespace and quotes are stripped; an empty result
    /// falls back to a generic title.
    #[tracing::instrument(name = "generate_title", skip_all, fields(model = %self.model.system_name))]
    pub async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let response = self.gateway.infer(&self.request_for(prompt)).await?;
        Ok(clean_title(&response.content))
    }
}

fn clean_title(raw: &str) -> String {
    let title = raw
        .trim()
        .trim_start_matches("Title:")
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();
    if title.is_empty() {
        FALLBACK_CHAT_TITLE.to_string()
    } else {
        title.to_string()
    }
}
