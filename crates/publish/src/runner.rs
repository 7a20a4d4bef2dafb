//! Drives one publish pass: inter-send delays, the single rate-limit retry,
//! and skip-and-continue on item failures.

use {
    guildsync_directory::Payload,
    tracing::{error, info, warn},
};

use crate::{
    delay::AdaptiveDelay,
    sink::{PublishOutcome, Sink},
};

/// What happened across one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sent: usize,
    pub failed: usize,
    /// Payloads that were resent after a rate limit.
    pub retried: usize,
}

/// Publishes a sequence of payloads through one sink.
///
/// Owns the adaptive delay; a failed item never aborts the remaining items.
pub struct Publisher {
    sink: Box<dyn Sink>,
    delay: AdaptiveDelay,
}

impl Publisher {
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Self::with_delay(sink, AdaptiveDelay::default())
    }

    pub fn with_delay(sink: Box<dyn Sink>, delay: AdaptiveDelay) -> Self {
        Self { sink, delay }
    }

    /// Publish every payload in order, waiting the current adaptive delay
    /// between successive sends.
    ///
    /// On `RateLimited` the runner sleeps the sink-provided duration and
    /// resends the same payload exactly once; a second non-success marks the
    /// item failed and the pass moves on.
    pub async fn publish_all(&mut self, payloads: &[Payload]) -> RunReport {
        let mut report = RunReport::default();

        for (i, payload) in payloads.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay.current()).await;
            }

            match self.sink.publish(payload).await {
                PublishOutcome::Success => {
                    info!(sink = self.sink.name(), item = payload.label(), "sent");
                    report.sent += 1;
                    self.delay.on_success();
                },
                PublishOutcome::RateLimited { retry_after } => {
                    warn!(
                        sink = self.sink.name(),
                        item = payload.label(),
                        retry_after_secs = retry_after.as_secs(),
                        "rate limited, retrying once"
                    );
                    self.delay.on_failure();
                    tokio::time::sleep(retry_after).await;
                    report.retried += 1;

                    match self.sink.publish(payload).await {
                        PublishOutcome::Success => {
                            info!(sink = self.sink.name(), item = payload.label(), "sent on retry");
                            report.sent += 1;
                            self.delay.on_success();
                        },
                        PublishOutcome::RateLimited { .. } => {
                            error!(
                                sink = self.sink.name(),
                                item = payload.label(),
                                "still rate limited after retry, skipping item"
                            );
                            report.failed += 1;
                            self.delay.on_failure();
                        },
                        PublishOutcome::Failure { reason } => {
                            error!(
                                sink = self.sink.name(),
                                item = payload.label(),
                                reason = %reason,
                                "retry failed, skipping item"
                            );
                            report.failed += 1;
                            self.delay.on_failure();
                        },
                    }
                },
                PublishOutcome::Failure { reason } => {
                    error!(
                        sink = self.sink.name(),
                        item = payload.label(),
                        reason = %reason,
                        "publish failed, skipping item"
                    );
                    report.failed += 1;
                    self.delay.on_failure();
                },
            }
        }

        report
    }

    /// The delay that would apply to the next send.
    pub fn current_delay(&self) -> std::time::Duration {
        self.delay.current()
    }
}
