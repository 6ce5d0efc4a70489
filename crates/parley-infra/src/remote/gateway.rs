//! HttpInferenceGateway -- [`InferenceGateway`] over the model-serving HTTP API.
//!
//! POSTs `{prompt, model, provider, is_agent}` to `{base_url}/llm` with the
//! caller identity in `X-User-Id`. Extra agent work is reported in the
//! `agent-use` response header.

use std::time::Duration;

use parley_core::llm::gateway::InferenceGateway;
use parley_types::llm::{InferenceError, InferenceRequest, InferenceResponse, Turn, Usage};
use serde::{Deserialize, Serialize};

use super::endpoint;

const CALLER_HEADER: &str = "X-User-Id";
const AGENT_USAGE_HEADER: &str = "agent-use";

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    prompt: &'a [Turn],
    model: &'a str,
    provider: &'a [String],
    is_agent: bool,
}

/// Body shape before validation. `content` is checked separately so a
/// missing or non-string value is reported as a protocol violation.
#[derive(Debug, Deserialize)]
struct GatewayBody {
    content: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Inference gateway client.
#[derive(Debug, Clone)]
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpInferenceGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout(self.timeout.as_secs())
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}

fn agent_usage(headers: &reqwest::header::HeaderMap) -> u32 {
    headers
        .get(AGENT_USAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.ceil() as u32)
        .unwrap_or(0)
}

impl InferenceGateway for HttpInferenceGateway {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let body = GatewayRequest {
            prompt: &request.conversation,
            model: &request.model.system_name,
            provider: &request.model.providers,
            is_agent: request.agent_mode,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "/llm"))
            .header(CALLER_HEADER, &request.caller)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let agent_usage = agent_usage(response.headers());
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let body: GatewayBody = serde_json::from_slice(&bytes)
            .map_err(|e| InferenceError::InvalidResponse(format!("failed to parse body: {e}")))?;

        let content = match body.content {
            Some(serde_json::Value::String(content)) => content,
            Some(other) => {
                return Err(InferenceError::InvalidResponse(format!(
                    "`content` must be a string, got {other}"
                )));
            }
            None => {
                return Err(InferenceError::InvalidResponse(
                    "missing `content` field".to_string(),
                ));
            }
        };

        tracing::debug!(
            model = %request.model.system_name,
            agent_usage,
            "gateway call completed"
        );

        Ok(InferenceResponse {
            content,
            kind: body.kind.unwrap_or_else(|| "text".to_string()),
            usage: body.usage.unwrap_or_default(),
            agent_usage,
        })
    }
}
