//! Next-fire computation for both scheduling policies.

use std::{str::FromStr, time::Duration};

use {
    chrono::{DateTime, TimeZone, Utc},
    chrono_tz::Tz,
    cron::Schedule,
    guildsync_config::ScheduleConfig,
};

use crate::error::{Error, Result};

/// When the pipeline runs next. Implementations are pure over wall-clock
/// input so scheduling policy is testable without mocking time.
pub trait Trigger: Send + Sync {
    /// The next fire strictly after `after`, or `None` when the schedule has
    /// no future fires.
    fn next_fire(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Cron-expression trigger, evaluated in a fixed timezone.
pub struct CronTrigger {
    schedule: Schedule,
    tz: Tz,
    expr: String,
}

impl CronTrigger {
    /// Parse a cron expression. Five-field expressions (min hour dom month
    /// dow) are accepted by padding to the seven-field form the `cron` crate
    /// requires (sec min hour dom month dow year).
    pub fn new(expr: &str, tz: Tz) -> Result<Self> {
        let schedule = Schedule::from_str(expr).or_else(|_| {
            let padded = format!("0 {expr} *");
            Schedule::from_str(&padded)
        })?;
        Ok(Self {
            schedule,
            tz,
            expr: expr.to_string(),
        })
    }
}

impl Trigger for CronTrigger {
    fn next_fire(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let local = after.with_timezone(&self.tz);
        Ok(self
            .schedule
            .after(&local)
            .next()
            .map(|dt| dt.with_timezone(&Utc)))
    }

    fn describe(&self) -> String {
        format!("cron '{}' ({})", self.expr, self.tz)
    }
}

/// Fixed-interval trigger anchored at a first-run instant.
pub struct IntervalTrigger {
    anchor: DateTime<Utc>,
    every_ms: i64,
}

impl IntervalTrigger {
    pub fn new(anchor: DateTime<Utc>, every: Duration) -> Result<Self> {
        let every_ms = i64::try_from(every.as_millis())
            .map_err(|_| Error::InvalidInterval("interval too large".into()))?;
        if every_ms == 0 {
            return Err(Error::InvalidInterval("interval must be > 0".into()));
        }
        Ok(Self { anchor, every_ms })
    }
}

impl Trigger for IntervalTrigger {
    fn next_fire(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        if self.anchor > after {
            // Anchor is in the future — first fire is the anchor itself.
            return Ok(Some(self.anchor));
        }
        // How many whole intervals have elapsed since the anchor?
        let elapsed_ms = (after - self.anchor).num_milliseconds();
        let intervals = elapsed_ms / self.every_ms;
        let next = self.anchor + chrono::Duration::milliseconds((intervals + 1) * self.every_ms);
        Ok(Some(next))
    }

    fn describe(&self) -> String {
        format!(
            "every {}s from {}",
            self.every_ms / 1000,
            self.anchor.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Build the configured trigger. Called once at startup; any error here is
/// a fatal configuration error.
pub fn trigger_from_schedule(cfg: &ScheduleConfig) -> Result<Box<dyn Trigger>> {
    let tz = cfg.timezone()?;

    if let Some(expr) = cfg.cron.as_deref() {
        return Ok(Box::new(CronTrigger::new(expr, tz)?));
    }

    let every_secs = cfg.every_secs.unwrap_or_default();
    let anchor = match cfg.first_run()? {
        Some(naive) => tz
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| Error::InvalidLocalTime {
                value: naive.to_string(),
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(Box::new(IntervalTrigger::new(
        anchor,
        Duration::from_secs(every_secs),
    )?))
}
