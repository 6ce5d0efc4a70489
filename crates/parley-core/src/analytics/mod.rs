//! Best-effort usage analytics.
//!
//! - `AnalyticsSink`: RPITIT port to the analytics platform
//! - `BoxAnalyticsSink`: dynamic dispatch wrapper
//! - `AnalyticsDispatcher`: bounded queue drained by a background worker, so
//!   the pipeline never waits on or fails because of analytics

pub mod dispatcher;
pub mod sink;
