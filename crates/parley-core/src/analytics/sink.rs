//! AnalyticsSink trait and its boxed wrapper.

use std::future::Future;
use std::pin::Pin;

use parley_types::analytics::{AnalyticsError, UsageEvent};

/// Destination for usage events.
pub trait AnalyticsSink: Send + Sync {
    fn capture(
        &self,
        event: &UsageEvent,
    ) -> impl Future<Output = Result<(), AnalyticsError>> + Send;
}

/// Sink used when analytics is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    async fn capture(&self, _event: &UsageEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

pub trait AnalyticsSinkDyn: Send + Sync {
    fn capture_boxed<'a>(
        &'a self,
        event: &'a UsageEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + 'a>>;
}

impl<T: AnalyticsSink> AnalyticsSinkDyn for T {
    fn capture_boxed<'a>(
        &'a self,
        event: &'a UsageEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + 'a>> {
        Box::pin(self.capture(event))
    }
}

/// Type-erased analytics sink.
pub struct BoxAnalyticsSink {
    inner: Box<dyn AnalyticsSinkDyn + Send + Sync>,
}

impl BoxAnalyticsSink {
    pub fn new<T: AnalyticsSink + 'static>(sink: T) -> Self {
        Self {
            inner: Box::new(sink),
        }
    }

    pub async fn capture(&self, event: &UsageEvent) -> Result<(), AnalyticsError> {
        self.inner.capture_boxed(event).await
    }
}
