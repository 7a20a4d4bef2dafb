//! Configuration loading, env substitution, and validation.
//!
//! Config files: `guildsync.toml`, `guildsync.yaml`, or `guildsync.json`,
//! searched in `./` then `~/.config/guildsync/`. When no file is found the
//! classic environment variables (`SOURCE_TOKEN`, `SOURCE_GUILD_ID`,
//! `SINK_URL`, ...) are read instead.
//!
//! Supports `${ENV_VAR}` substitution in the raw file text.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{discover_and_load, load_config},
    schema::{
        GuildsyncConfig, PurgeConfig, PurgePolicy, ScheduleConfig, ServerConfig, SinkConfig,
        SourceConfig,
    },
};
