//! Sink publishing: the [`Sink`] trait, concrete webhook / paste / tabular
//! sinks, the adaptive inter-send delay, and the publish runner.

pub mod delay;
pub mod paste;
pub mod runner;
pub mod sink;
pub mod tabular;
pub mod webhook;

pub use {
    delay::AdaptiveDelay,
    paste::PasteSink,
    runner::{Publisher, RunReport},
    sink::{PublishOutcome, Sink},
    tabular::{MemoryTabularStore, RestTabularStore, SheetSink, TabularStore},
    webhook::{WebhookSink, webhook_id_from_url},
};
