//! HTTP clients for the remote services the pipeline depends on.
//!
//! Each client implements a port trait from `parley-core`. Requests carry a
//! per-call timeout and no retry; callers decide what a failure means.

pub mod enrichment;
pub mod gateway;
pub mod posthog;

pub use enrichment::EnrichmentClient;
pub use gateway::HttpInferenceGateway;
pub use posthog::PosthogSink;

/// Join a base URL and a path without doubling the slash.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
