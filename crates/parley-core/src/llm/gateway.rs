//! InferenceGateway trait -- the port to the remote model-serving service.

use parley_types::llm::{InferenceError, InferenceRequest, InferenceResponse};

/// One-shot completion against the remote inference gateway.
///
/// Implementations apply their own bounded timeout and validate the
/// response shape; a body without a string `content` is an error, never
/// an empty success. No retries.
pub trait InferenceGateway: Send + Sync {
    fn infer(
        &self,
        request: &InferenceRequest,
    ) -> impl std::future::Future<Output = Result<InferenceResponse, InferenceError>> + Send;
}
