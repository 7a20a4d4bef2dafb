//! Source-server access: the [`DirectorySource`] trait the extractor reads
//! through, plus the Discord REST implementation.

pub mod discord;
pub mod error;
pub mod provider;
pub mod types;

pub use {
    discord::DiscordSource,
    error::{Error, Result},
    provider::{DirectorySource, MessagePurger, PurgeReport, PurgeSpec},
    types::{ChannelGroup, ChannelKind, SubChannel},
};
