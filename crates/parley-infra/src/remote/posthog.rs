//! PosthogSink -- [`AnalyticsSink`] that posts `$ai_generation` events.
//!
//! The project key is held as a [`SecretString`] and only exposed while the
//! request body is built. `PosthogSink` does not derive Debug.

use std::time::Duration;

use parley_core::analytics::sink::AnalyticsSink;
use parley_types::analytics::{AnalyticsError, UsageEvent};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use super::endpoint;

const CAPTURE_PATH: &str = "/i/v0/e/";
const GENERATION_EVENT: &str = "$ai_generation";

pub struct PosthogSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    timeout: Duration,
}

impl PosthogSink {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
        }
    }

    fn payload(&self, event: &UsageEvent) -> serde_json::Value {
        json!({
            "api_key": self.api_key.expose_secret(),
            "event": GENERATION_EVENT,
            "properties": {
                "distinct_id": event.user_id.to_string(),
                "$ai_trace_id": event.chat_id.to_string(),
                "$ai_model": event.model,
                "$ai_provider": event.provider,
                "$ai_input_tokens": event.usage.prompt_tokens,
                "$ai_output_tokens": event.usage.completion_tokens,
                "$ai_input": [text_message("user", &event.prompt)],
                "$ai_output_choices": [text_message("assistant", &event.completion)],
            },
            "timestamp": event.timestamp.to_rfc3339(),
        })
    }
}

fn text_message(role: &str, text: &str) -> serde_json::Value {
    json!({
        "role": role,
        "content": [{"type": "text", "text": text}],
    })
}

impl AnalyticsSink for PosthogSink {
    async fn capture(&self, event: &UsageEvent) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(endpoint(&self.endpoint, CAPTURE_PATH))
            .timeout(self.timeout)
            .json(&self.payload(event))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyticsError::Timeout
                } else {
                    AnalyticsError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Status(status.as_u16()));
        }
        Ok(())
    }
}
