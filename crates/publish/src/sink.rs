//! The sink contract every destination implements.

use std::time::Duration;

use {async_trait::async_trait, guildsync_directory::Payload};

/// How one publish attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Success,
    /// The sink asked us to slow down; retry the same payload once after
    /// waiting `retry_after`.
    RateLimited { retry_after: Duration },
    /// Item-granular failure: logged and skipped, never aborts the run.
    Failure { reason: String },
}

impl PublishOutcome {
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }
}

/// One external destination. Transport errors are folded into
/// [`PublishOutcome::Failure`]; a sink never panics the pipeline.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Sink identifier for logs (e.g. "webhook", "paste", "sheet").
    fn name(&self) -> &'static str;

    async fn publish(&self, payload: &Payload) -> PublishOutcome;
}
