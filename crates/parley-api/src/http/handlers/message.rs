//! Message endpoint: runs one inbound message through the pipeline.
//!
//! Attachments arrive as base64 JSON fields and are validated here, once;
//! everything downstream receives a typed [`MessageRequest`].

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use base64::Engine;
use serde::Deserialize;

use parley_types::chat::ChatSelector;
use parley_types::enrich::FileAttachment;
use parley_types::pipeline::{MessageReply, MessageRequest};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /api/v1/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub external_id: String,
    #[serde(default)]
    pub prompt: String,
    /// Chat to continue; absent, `""` or `"0"` starts a new chat.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Base64 image for OCR.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub file: Option<FileBody>,
}

/// Uploaded file as sent by clients.
#[derive(Debug, Deserialize)]
pub struct FileBody {
    /// Base64 file bytes.
    pub data: String,
    pub name: String,
    #[serde(default = "default_mime")]
    pub mime: String,
}

fn default_mime() -> String {
    "application/octet-stream".to_string()
}

fn check_base64(field: &str, value: &str) -> Result<(), AppError> {
    base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("{field} must be valid base64")))
}

impl SendMessageBody {
    /// Validate the raw body into a pipeline request.
    pub fn into_request(self) -> Result<MessageRequest, AppError> {
        let external_id = self.external_id.trim().to_string();
        if external_id.is_empty() {
            return Err(AppError::Validation("external_id is required".to_string()));
        }

        let image = self.image.filter(|i| !i.trim().is_empty());
        if self.prompt.trim().is_empty() && image.is_none() && self.file.is_none() {
            return Err(AppError::Validation(
                "prompt is required when no attachment is sent".to_string(),
            ));
        }

        if let Some(image) = &image {
            check_base64("image", image)?;
        }
        let file = match self.file {
            Some(file) => {
                check_base64("file.data", &file.data)?;
                if file.name.trim().is_empty() {
                    return Err(AppError::Validation("file.name is required".to_string()));
                }
                Some(FileAttachment {
                    buffer: file.data.trim().to_string(),
                    name: file.name,
                    mime: file.mime,
                })
            }
            None => None,
        };

        let chat = ChatSelector::parse(self.chat_id.as_deref()).map_err(AppError::Validation)?;

        Ok(MessageRequest {
            external_id,
            prompt: self.prompt,
            image: image.map(|i| i.trim().to_string()),
            file,
            chat,
        })
    }
}

/// POST /api/v1/messages - Send a message and get the assistant's reply.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<ApiResponse<MessageReply>>, AppError> {
    let start = Instant::now();
    let request = body.into_request()?;

    let reply = state
        .orchestrator
        .handle(request)
        .await
        .map_err(AppError::Pipeline)?;

    Ok(Json(ApiResponse::timed(reply, start)))
}
