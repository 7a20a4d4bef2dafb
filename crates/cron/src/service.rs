//! Scheduler service: one immediate run at start, then sleep-until-next-fire.
//!
//! Exactly one run is active at a time. The loop only computes the next fire
//! after the current run completes, so fires that elapse while a run is
//! active are dropped (and logged) rather than queued — runs are idempotent
//! and re-triggered soon regardless.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
    tokio::sync::watch,
    tracing::{error, info, warn},
};

use crate::trigger::Trigger;

/// Callback that performs one sync run.
pub type RunFn =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

/// Idle → Running → Idle. A failed run returns to Idle and waits for the
/// next trigger; there is no terminal failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Snapshot shared with the liveness responder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_ok: Option<bool>,
    pub runs: u64,
}

impl Default for SchedulerStatus {
    fn default() -> Self {
        Self {
            state: SchedulerState::Idle,
            last_run_at: None,
            last_run_ok: None,
            runs: 0,
        }
    }
}

pub struct SyncScheduler {
    trigger: Box<dyn Trigger>,
    run: RunFn,
    /// Overall deadline for one run; a hung sink call must not stall the
    /// scheduler forever.
    deadline: Option<Duration>,
    status: watch::Sender<SchedulerStatus>,
}

impl SyncScheduler {
    pub fn new(
        trigger: Box<dyn Trigger>,
        run: RunFn,
        deadline: Option<Duration>,
    ) -> (Self, watch::Receiver<SchedulerStatus>) {
        let (status, rx) = watch::channel(SchedulerStatus::default());
        (
            Self {
                trigger,
                run,
                deadline,
                status,
            },
            rx,
        )
    }

    /// Execute a single run: Idle → Running → Idle, never propagating run
    /// errors to the loop. Returns whether the run succeeded so one-shot
    /// callers can surface the outcome in their exit status.
    pub async fn run_once(&self) -> bool {
        let started_at = Utc::now();
        self.status.send_modify(|s| {
            s.state = SchedulerState::Running;
            s.last_run_at = Some(started_at);
        });

        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, (self.run)()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "run exceeded deadline of {}s",
                    deadline.as_secs()
                )),
            },
            None => (self.run)().await,
        };

        let ok = result.is_ok();
        if let Err(e) = result {
            error!(error = %e, "sync run failed");
        } else {
            info!("sync run completed");
        }

        self.status.send_modify(|s| {
            s.state = SchedulerState::Idle;
            s.last_run_ok = Some(ok);
            s.runs += 1;
        });
        ok
    }

    /// Run forever: immediate run at start, then fire on the trigger's
    /// schedule. Returns when the schedule is exhausted. Cancellation is
    /// process shutdown; the caller selects against its shutdown signal.
    pub async fn run_loop(&self) -> crate::Result<()> {
        info!(schedule = %self.trigger.describe(), "scheduler started");
        self.run_once().await;

        loop {
            let completed_at = Utc::now();
            let Some(next) = self.trigger.next_fire(completed_at)? else {
                info!("schedule exhausted, scheduler stopping");
                return Ok(());
            };

            let dropped = dropped_fires(self.trigger.as_ref(), self.last_fire_at(), completed_at)?;
            if dropped > 0 {
                warn!(dropped, "run overlapped schedule, dropping elapsed fire(s)");
            }

            let wait = (next - completed_at).to_std().unwrap_or(Duration::ZERO);
            info!(next = %next.format("%Y-%m-%d %H:%M:%S UTC"), "waiting for next run");
            tokio::time::sleep(wait).await;
            self.run_once().await;
        }
    }

    fn last_fire_at(&self) -> Option<DateTime<Utc>> {
        self.status.borrow().last_run_at
    }

    /// Current status snapshot.
    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }
}

/// How many fires elapsed between a run starting and completing. These are
/// dropped, never queued.
fn dropped_fires(
    trigger: &dyn Trigger,
    started_at: Option<DateTime<Utc>>,
    completed_at: DateTime<Utc>,
) -> crate::Result<u32> {
    let Some(started_at) = started_at else {
        return Ok(0);
    };
    let mut count = 0;
    let mut cursor = started_at;
    while let Some(fire) = trigger.next_fire(cursor)? {
        if fire > completed_at {
            break;
        }
        count += 1;
        cursor = fire;
    }
    Ok(count)
}
