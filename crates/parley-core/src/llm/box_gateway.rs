//! BoxInferenceGateway -- object-safe dynamic dispatch wrapper for InferenceGateway.
//!
//! 1. Define an object-safe `InferenceGatewayDyn` trait with boxed futures
//! 2. Blanket-impl `InferenceGatewayDyn` for all `T: InferenceGateway`
//! 3. `BoxInferenceGateway` wraps `Box<dyn InferenceGatewayDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{InferenceError, InferenceRequest, InferenceResponse};

use super::gateway::InferenceGateway;

/// Object-safe version of [`InferenceGateway`] with boxed futures.
pub trait InferenceGatewayDyn: Send + Sync {
    fn infer_boxed<'a>(
        &'a self,
        request: &'a InferenceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InferenceResponse, InferenceError>> + Send + 'a>>;
}

impl<T: InferenceGateway> InferenceGatewayDyn for T {
    fn infer_boxed<'a>(
        &'a self,
        request: &'a InferenceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InferenceResponse, InferenceError>> + Send + 'a>> {
        Box::pin(self.infer(request))
    }
}

/// Type-erased inference gateway.
///
/// Lets the orchestrator and title generator share one gateway client
/// without carrying its concrete type in their signatures.
pub struct BoxInferenceGateway {
    inner: Box<dyn InferenceGatewayDyn + Send + Sync>,
}

impl BoxInferenceGateway {
    pub fn new<T: InferenceGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub async fn infer(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        self.inner.infer_boxed(request).await
    }
}

impl std::fmt::Debug for BoxInferenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxInferenceGateway").finish_non_exhaustive()
    }
}
