//! Scheduling: the [`Trigger`] abstraction (cron expression or fixed
//! interval from an anchor) and the scheduler service that drives sync runs.

pub mod error;
pub mod service;
pub mod trigger;

pub use {
    error::{Error, Result},
    service::{RunFn, SchedulerState, SchedulerStatus, SyncScheduler},
    trigger::{CronTrigger, IntervalTrigger, Trigger, trigger_from_schedule},
};
