//! Config schema types for the directory-sync bot.

use {
    chrono::NaiveDateTime,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::error::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildsyncConfig {
    pub source: SourceConfig,
    pub sink: Option<SinkConfig>,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
    pub purge: PurgeConfig,
    /// Ordered allow-list of category display names. Extraction output
    /// follows this order, not the server's.
    pub categories: Vec<String>,
}

/// Source guild connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Bot token for the source platform.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Numeric guild (server) id to read the directory from.
    pub guild_id: Option<u64>,
}

/// Where the formatted directory is delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SinkConfig {
    /// POST `{"content": ...}` to a webhook, one message per category.
    Webhook { url: String },
    /// Two-step: upload the full document to a paste host, then post the
    /// resulting link to a webhook.
    Paste {
        create_url: String,
        webhook_url: String,
    },
    /// Tabular store speaking the clear/append/read row API.
    Sheet { endpoint: String },
}

/// When and how often the sync pipeline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression (five-field standard or seven-field with seconds).
    /// Mutually exclusive with `every_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// Fixed repeat interval in seconds, anchored at `first_run_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_secs: Option<u64>,
    /// Local anchor datetime for interval schedules, `YYYY-MM-DD HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_run_at: Option<String>,
    /// IANA timezone name for `cron` / `first_run_at`. Defaults to UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Overall deadline for one sync run, in seconds. A hung sink call must
    /// not stall the scheduler forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_deadline_secs: Option<u64>,
}

impl ScheduleConfig {
    pub const DEFAULT_RUN_DEADLINE_SECS: u64 = 600;

    /// Resolve the configured timezone, defaulting to UTC.
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        match self.timezone.as_deref() {
            None => Ok(chrono_tz::UTC),
            Some(name) => name.parse().map_err(|_| Error::UnknownTimezone {
                timezone: name.to_string(),
            }),
        }
    }

    /// Parse `first_run_at` as a naive local datetime.
    pub fn first_run(&self) -> Result<Option<NaiveDateTime>> {
        let Some(value) = self.first_run_at.as_deref() else {
            return Ok(None);
        };
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
            .map(Some)
            .map_err(|_| Error::InvalidFirstRun {
                value: value.to_string(),
            })
    }

    pub fn run_deadline_secs(&self) -> u64 {
        self.run_deadline_secs
            .unwrap_or(Self::DEFAULT_RUN_DEADLINE_SECS)
    }
}

/// Liveness server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Which previously-posted messages are deleted before publishing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PurgePolicy {
    /// Never delete anything.
    Off,
    /// Delete every message authored by a bot (original behavior).
    #[default]
    AllBots,
    /// Delete only messages posted by the configured webhook identity.
    WebhookOnly,
}

/// Pre-publish message cleanup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    pub policy: PurgePolicy,
    /// How far back to scan each channel's history, in messages.
    pub history_limit: u32,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            policy: PurgePolicy::default(),
            history_limit: 500,
        }
    }
}

impl GuildsyncConfig {
    /// Validate everything that must hold before the process starts.
    ///
    /// Cron expression syntax is checked later, when the trigger is built;
    /// a parse failure there is equally fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.source.token.is_none() {
            return Err(Error::invalid("source.token is required"));
        }
        if self.source.guild_id.is_none() {
            return Err(Error::invalid("source.guild_id is required"));
        }
        if self.sink.is_none() {
            return Err(Error::invalid("a sink must be configured"));
        }
        if self.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::invalid("categories allow-list is empty"));
        }
        match (&self.schedule.cron, self.schedule.every_secs) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    "schedule.cron and schedule.every_secs are mutually exclusive",
                ));
            },
            (None, None) => {
                return Err(Error::invalid(
                    "one of schedule.cron or schedule.every_secs is required",
                ));
            },
            (None, Some(0)) => {
                return Err(Error::invalid("schedule.every_secs must be > 0"));
            },
            _ => {},
        }
        self.schedule.timezone()?;
        self.schedule.first_run()?;
        Ok(())
    }

    /// Expose the source token for building the platform client.
    pub fn source_token(&self) -> Result<&str> {
        self.source
            .token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .ok_or_else(|| Error::invalid("source.token is required"))
    }

    /// Allow-list entries with blank lines dropped.
    pub fn allow_list(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect()
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
