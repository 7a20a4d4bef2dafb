//! Transient directory entities, rebuilt on every pipeline run.

use serde::{Deserialize, Serialize};

/// What a sub-channel carries. Only text-capable channels are eligible for
/// extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChannelKind {
    Text,
    Voice,
    Other,
}

/// A member channel of a [`ChannelGroup`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubChannel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    /// Id of the parent group, as presented by the server.
    pub group_id: String,
}

impl SubChannel {
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }
}

/// A named channel container ("category") with its member sub-channels in
/// server presentation order. Lives only within one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    pub id: String,
    pub name: String,
    pub channels: Vec<SubChannel>,
}
