//! Traits the rest of the pipeline reads the source server through.

use {async_trait::async_trait, guildsync_config::PurgePolicy};

use crate::{
    error::Result,
    types::{ChannelGroup, SubChannel},
};

/// Read access to the source server's channel directory.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// All channel groups in the order the server presents them, each
    /// populated with its member sub-channels.
    async fn list_groups(&self) -> Result<Vec<ChannelGroup>>;

    /// The text-capable sub-channels of one group, in member order.
    async fn list_text_channels(&self, group: &ChannelGroup) -> Result<Vec<SubChannel>>;
}

/// Parameters for a pre-publish message purge.
#[derive(Debug, Clone)]
pub struct PurgeSpec {
    pub policy: PurgePolicy,
    /// Per-channel history scan depth, in messages.
    pub history_limit: u32,
    /// Webhook identity for [`PurgePolicy::WebhookOnly`].
    pub webhook_id: Option<String>,
}

/// Outcome of a best-effort purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: u64,
    /// Deletions that failed and were skipped.
    pub failed: u64,
}

/// Best-effort deletion of previously-published bot messages.
///
/// Individual deletion failures are logged and counted, never propagated;
/// only a failure to enumerate channels at all surfaces as an error.
#[async_trait]
pub trait MessagePurger: Send + Sync {
    async fn purge(&self, spec: &PurgeSpec) -> Result<PurgeReport>;
}
