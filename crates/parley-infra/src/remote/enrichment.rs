//! EnrichmentClient -- OCR and file recognition over HTTP.
//!
//! One client serves both [`ImageRecognizer`] (`POST /ocr`) and
//! [`FileRecognizer`] (`POST /files`); they share a base URL and timeout.

use std::time::Duration;

use parley_core::enrich::{FileRecognizer, ImageRecognizer};
use parley_types::enrich::{ContentKind, EnrichError, FileAttachment, Recognition};
use serde::{Deserialize, Serialize};

use super::endpoint;

const OCR_SERVICE: &str = "ocr";
const FILES_SERVICE: &str = "file recognition";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OcrRequest<'a> {
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct FilesBody {
    content: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Client for the OCR and file recognition endpoints.
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl EnrichmentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// POST a JSON body and return the raw response text of a 2xx reply.
    async fn post<B: Serialize + ?Sized>(
        &self,
        service: &'static str,
        path: &str,
        body: &B,
    ) -> Result<String, EnrichError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, path))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.map_error(service, e))
    }

    fn map_error(&self, service: &'static str, err: reqwest::Error) -> EnrichError {
        if err.is_timeout() {
            EnrichError::Timeout {
                service,
                secs: self.timeout.as_secs(),
            }
        } else {
            EnrichError::Transport {
                service,
                message: err.to_string(),
            }
        }
    }
}

/// The OCR endpoint answers with bare text, a JSON string, or an object
/// carrying the text under `text` or `content`.
fn ocr_text(body: String) -> String {
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(serde_json::Value::Object(map)) => ["text", "content"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or(body),
        _ => body,
    }
}

impl ImageRecognizer for EnrichmentClient {
    async fn recognize_image(&self, image_base64: &str) -> Result<String, EnrichError> {
        let body = self
            .post(OCR_SERVICE, "/ocr", &OcrRequest { image_base64 })
            .await?;
        Ok(ocr_text(body))
    }
}

impl FileRecognizer for EnrichmentClient {
    async fn recognize_file(&self, file: &FileAttachment) -> Result<Recognition, EnrichError> {
        let body = self.post(FILES_SERVICE, "/files", file).await?;

        let parsed: FilesBody =
            serde_json::from_str(&body).map_err(|e| EnrichError::InvalidResponse {
                service: FILES_SERVICE,
                message: e.to_string(),
            })?;

        let content = match parsed.content {
            Some(serde_json::Value::String(content)) => content,
            _ => {
                return Err(EnrichError::InvalidResponse {
                    service: FILES_SERVICE,
                    message: "`content` must be a string".to_string(),
                });
            }
        };

        let kind = parsed
            .kind
            .as_deref()
            .map(|k| k.parse().unwrap_or(ContentKind::Other))
            .unwrap_or(ContentKind::Other);

        tracing::debug!(name = %file.name, %kind, "file recognized");
        Ok(Recognition { content, kind })
    }
}
