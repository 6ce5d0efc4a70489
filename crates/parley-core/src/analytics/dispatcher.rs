//! Fire-and-forget dispatch of usage events.
//!
//! Built on a bounded `tokio::sync::mpsc` channel. `dispatch` never blocks:
//! when the queue is full or the worker has stopped the event is dropped
//! with a warning.

use std::time::Duration;

use parley_types::analytics::{AnalyticsError, UsageEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sink::BoxAnalyticsSink;

/// Producer half of the analytics queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AnalyticsDispatcher {
    sender: mpsc::Sender<UsageEvent>,
}

impl AnalyticsDispatcher {
    /// Start the worker that drains the queue into `sink`.
    ///
    /// Each delivery runs under `timeout`. The worker exits once every
    /// dispatcher clone is dropped, or when `cancel` fires after flushing
    /// the events already queued.
    pub fn spawn(
        sink: BoxAnalyticsSink,
        capacity: usize,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(sink, receiver, timeout, cancel));
        (Self { sender }, handle)
    }

    /// Queue an event without waiting. Failures are logged and swallowed.
    pub fn dispatch(&self, event: UsageEvent) {
        if let Err(e) = self.try_dispatch(event) {
            warn!(error = %e, "usage event dropped");
        }
    }

    fn try_dispatch(&self, event: UsageEvent) -> Result<(), AnalyticsError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AnalyticsError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AnalyticsError::Closed,
        })
    }
}

async fn run_worker(
    sink: BoxAnalyticsSink,
    mut receiver: mpsc::Receiver<UsageEvent>,
    timeout: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = receiver.recv() => match event {
                Some(event) => deliver(&sink, &event, timeout).await,
                None => break,
            },
            _ = cancel.cancelled() => {
                // Stop accepting new events, then flush what is already queued.
                receiver.close();
                while let Some(event) = receiver.recv().await {
                    deliver(&sink, &event, timeout).await;
                }
                break;
            }
        }
    }
    debug!("analytics worker stopped");
}

async fn deliver(sink: &BoxAnalyticsSink, event: &UsageEvent, timeout: Duration) {
    match tokio::time::timeout(timeout, sink.capture(event)).await {
        Ok(Ok(())) => debug!(chat_id = %event.chat_id, "usage event delivered"),
        Ok(Err(e)) => warn!(chat_id = %event.chat_id, error = %e, "usage event delivery failed"),
        Err(_) => warn!(
            chat_id = %event.chat_id,
            error = %AnalyticsError::Timeout,
            "usage event delivery failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, usage_event};

    #[tokio::test]
    async fn test_dispatched_event_reaches_sink() {
        let sink = RecordingSink::new();
        let cancel = CancellationToken::new();
        let (dispatcher, handle) = AnalyticsDispatcher::spawn(
            BoxAnalyticsSink::new(sink.clone()),
            8,
            Duration::from_secs(1),
            cancel.clone(),
        );

        dispatcher.dispatch(usage_event("hello"));
        drop(dispatcher);
        handle.await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].prompt, "hello");
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_worker() {
        let sink = RecordingSink::failing_first(1);
        let (dispatcher, handle) = AnalyticsDispatcher::spawn(
            BoxAnalyticsSink::new(sink.clone()),
            8,
            Duration::from_secs(1),
            CancellationToken::new(),
        );

        dispatcher.dispatch(usage_event("first"));
        dispatcher.dispatch(usage_event("second"));
        drop(dispatcher);
        handle.await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].prompt, "second");
    }

    #[tokio::test]
    async fn test_cancel_flushes_queued_events() {
        for _ in 0..20 {
            let sink = RecordingSink::new();
            let cancel = CancellationToken::new();
            let (dispatcher, handle) = AnalyticsDispatcher::spawn(
                BoxAnalyticsSink::new(sink.clone()),
                8,
                Duration::from_secs(1),
                cancel.clone(),
            );

            for prompt in ["one", "two", "three"] {
                dispatcher.dispatch(usage_event(prompt));
            }
            cancel.cancel();
            // A live dispatcher clone must not keep the worker alive.
            handle.await.unwrap();

            let prompts: Vec<String> = sink.events().into_iter().map(|e| e.prompt).collect();
            assert_eq!(prompts, vec!["one", "two", "three"]);
            assert!(matches!(
                dispatcher.try_dispatch(usage_event("late")),
                Err(AnalyticsError::Closed)
            ));
        }
    }

    #[tokio::test]
    async fn test_dispatch_after_cancel_is_swallowed() {
        let cancel = CancellationToken::new();
        let (dispatcher, handle) = AnalyticsDispatcher::spawn(
            BoxAnalyticsSink::new(RecordingSink::new()),
            1,
            Duration::from_secs(1),
            cancel.clone(),
        );
        cancel.cancel();
        handle.await.unwrap();

        assert!(matches!(
            dispatcher.try_dispatch(usage_event("late")),
            Err(AnalyticsError::Closed)
        ));
        // Must not panic.
        dispatcher.dispatch(usage_event("late"));
    }

    #[tokio::test]
    async fn test_full_queue_drops_event() {
        let (sender, _receiver) = mpsc::channel(1);
        let dispatcher = AnalyticsDispatcher { sender };
        dispatcher.try_dispatch(usage_event("one")).unwrap();
        assert!(matches!(
            dispatcher.try_dispatch(usage_event("two")),
            Err(AnalyticsError::QueueFull)
        ));
    }
}
