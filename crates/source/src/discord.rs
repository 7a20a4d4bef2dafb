//! Discord REST implementation of [`DirectorySource`] and [`MessagePurger`].
//!
//! Talks plain HTTP to the guild endpoints; no gateway connection is needed
//! to read the channel directory or to delete old bot messages.

use std::time::Duration;

use {
    async_trait::async_trait,
    guildsync_config::PurgePolicy,
    reqwest::{StatusCode, header::AUTHORIZATION},
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    provider::{DirectorySource, MessagePurger, PurgeReport, PurgeSpec},
    types::{ChannelGroup, ChannelKind, SubChannel},
};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord channel type discriminants, per the API docs.
const TYPE_GUILD_TEXT: u8 = 0;
const TYPE_GUILD_VOICE: u8 = 2;
const TYPE_GUILD_CATEGORY: u8 = 4;
const TYPE_GUILD_ANNOUNCEMENT: u8 = 5;

/// Messages fetched per history page (Discord's maximum).
const HISTORY_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    position: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    id: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    author: RawAuthor,
}

/// REST client for one source guild.
pub struct DiscordSource {
    client: reqwest::Client,
    base_url: String,
    auth: String,
    guild_id: u64,
}

impl DiscordSource {
    pub fn new(token: &str, guild_id: u64) -> Self {
        Self::with_base_url(API_BASE, token, guild_id)
    }

    /// Point the client at a different API origin (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, token: &str, guild_id: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            auth: format!("Bot {token}"),
            guild_id,
        }
    }

    fn unavailable(&self) -> Error {
        Error::Unavailable {
            guild_id: self.guild_id,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth.clone())
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Err(self.unavailable());
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    /// Check that the guild resolves at all.
    pub async fn ensure_ready(&self) -> Result<()> {
        let url = format!("{}/guilds/{}", self.base_url, self.guild_id);
        let _: serde_json::Value = self.get_json(&url).await?;
        Ok(())
    }

    /// Wait for the guild to become reachable before the first run.
    ///
    /// Transient transport errors are retried with a fixed backoff; a
    /// definitive not-found / not-accessible answer is returned immediately.
    pub async fn wait_ready(&self, max_attempts: u32, backoff: Duration) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.ensure_ready().await {
                Ok(()) => {
                    info!(guild_id = self.guild_id, "source guild reachable");
                    return Ok(());
                },
                Err(e @ Error::Unavailable { .. }) => return Err(e),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "source not ready yet, retrying");
                },
            }
            attempt += 1;
            tokio::time::sleep(backoff).await;
        }
    }

    async fn fetch_channels(&self) -> Result<Vec<RawChannel>> {
        let url = format!("{}/guilds/{}/channels", self.base_url, self.guild_id);
        self.get_json(&url).await
    }

    async fn fetch_history_page(
        &self,
        channel_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<Vec<RawMessage>> {
        let mut url = format!(
            "{}/channels/{}/messages?limit={}",
            self.base_url, channel_id, limit
        );
        if let Some(before) = before {
            url.push_str("&before=");
            url.push_str(before);
        }
        self.get_json(&url).await
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.base_url, channel_id, message_id
        );
        let resp = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.auth.clone())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

fn kind_of(raw_type: u8) -> ChannelKind {
    match raw_type {
        TYPE_GUILD_TEXT | TYPE_GUILD_ANNOUNCEMENT => ChannelKind::Text,
        TYPE_GUILD_VOICE => ChannelKind::Voice,
        _ => ChannelKind::Other,
    }
}

fn position_key(c: &RawChannel) -> (i64, &str) {
    (c.position.unwrap_or(i64::MAX), c.id.as_str())
}

/// Assemble categories with their member channels from the flat channel list,
/// preserving the server's presentation order (position, then id).
fn assemble_groups(mut raw: Vec<RawChannel>) -> Vec<ChannelGroup> {
    raw.sort_by(|a, b| position_key(a).cmp(&position_key(b)));

    let mut groups: Vec<ChannelGroup> = raw
        .iter()
        .filter(|c| c.kind == TYPE_GUILD_CATEGORY)
        .map(|c| ChannelGroup {
            id: c.id.clone(),
            name: c.name.clone().unwrap_or_default(),
            channels: Vec::new(),
        })
        .collect();

    for c in &raw {
        if c.kind == TYPE_GUILD_CATEGORY {
            continue;
        }
        let Some(parent_id) = c.parent_id.as_deref() else {
            continue; // top-level channel outside any group
        };
        if let Some(group) = groups.iter_mut().find(|g| g.id == parent_id) {
            group.channels.push(SubChannel {
                id: c.id.clone(),
                name: c.name.clone().unwrap_or_default(),
                kind: kind_of(c.kind),
                group_id: parent_id.to_string(),
            });
        }
    }

    groups
}

#[async_trait]
impl DirectorySource for DiscordSource {
    async fn list_groups(&self) -> Result<Vec<ChannelGroup>> {
        let raw = self.fetch_channels().await?;
        let groups = assemble_groups(raw);
        debug!(guild_id = self.guild_id, groups = groups.len(), "listed channel groups");
        Ok(groups)
    }

    async fn list_text_channels(&self, group: &ChannelGroup) -> Result<Vec<SubChannel>> {
        // Groups come back from `list_groups` already populated; no second
        // round-trip is needed.
        Ok(group
            .channels
            .iter()
            .filter(|c| c.is_text())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessagePurger for DiscordSource {
    async fn purge(&self, spec: &PurgeSpec) -> Result<PurgeReport> {
        if spec.policy == PurgePolicy::Off {
            return Ok(PurgeReport::default());
        }

        let raw = self.fetch_channels().await?;
        let text_channels: Vec<RawChannel> = raw
            .into_iter()
            .filter(|c| kind_of(c.kind) == ChannelKind::Text)
            .collect();

        let mut report = PurgeReport::default();
        for channel in &text_channels {
            if let Err(e) = self
                .purge_channel(channel, spec, &mut report)
                .await
            {
                // Best effort: a channel we cannot read is skipped.
                warn!(channel = %channel.id, error = %e, "skipping channel during purge");
            }
        }

        info!(
            deleted = report.deleted,
            failed = report.failed,
            "purge finished"
        );
        Ok(report)
    }
}

impl DiscordSource {
    fn message_matches(spec: &PurgeSpec, msg: &RawMessage) -> bool {
        match spec.policy {
            PurgePolicy::Off => false,
            PurgePolicy::AllBots => msg.author.bot,
            PurgePolicy::WebhookOnly => spec
                .webhook_id
                .as_deref()
                .is_some_and(|id| msg.author.id == id),
        }
    }

    async fn purge_channel(
        &self,
        channel: &RawChannel,
        spec: &PurgeSpec,
        report: &mut PurgeReport,
    ) -> Result<()> {
        let mut scanned: u32 = 0;
        let mut before: Option<String> = None;

        while scanned < spec.history_limit {
            let limit = HISTORY_PAGE_SIZE.min(spec.history_limit - scanned);
            let page = self
                .fetch_history_page(&channel.id, limit, before.as_deref())
                .await?;
            let page_len = page.len() as u32;

            for msg in &page {
                if Self::message_matches(spec, msg) {
                    match self.delete_message(&channel.id, &msg.id).await {
                        Ok(()) => report.deleted += 1,
                        Err(e) => {
                            report.failed += 1;
                            warn!(message = %msg.id, error = %e, "failed to delete message");
                        },
                    }
                }
            }

            before = page.last().map(|m| m.id.clone());
            scanned += page_len;
            if page_len < limit {
                break; // history exhausted
            }
        }

        Ok(())
    }
}
