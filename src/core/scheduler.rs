//! The three periodic triggers.
//!
//! Refill, drain, and heartbeat each run in their own task on their own
//! interval. Missed ticks are skipped, never bunched up. The first tick of
//! every trigger is one full period after start.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::context::{PulseContext, RefillOutcome};

/// One of the periodic triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Refill,
    Drain,
    Heartbeat,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::Refill, Trigger::Drain, Trigger::Heartbeat];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Refill => "refill",
            Self::Drain => "drain",
            Self::Heartbeat => "heartbeat",
        }
    }

    fn period(&self, ctx: &PulseContext) -> Duration {
        let schedule = ctx.schedule();
        match self {
            Self::Refill => schedule.refill_every(),
            Self::Drain => schedule.drain_every(),
            Self::Heartbeat => schedule.heartbeat_every(),
        }
    }

    async fn fire(&self, ctx: &PulseContext) {
        match self {
            Self::Refill => {
                ctx.refill().await;
            }
            Self::Drain => {
                ctx.drain().await;
            }
            Self::Heartbeat => {
                ctx.heartbeat().await;
            }
        }
    }
}

/// Owns the trigger tasks
pub struct Scheduler {
    ctx: Arc<PulseContext>,
    tasks: JoinSet<()>,
}

impl Scheduler {
    pub fn new(ctx: Arc<PulseContext>) -> Self {
        Self {
            ctx,
            tasks: JoinSet::new(),
        }
    }

    /// Refill immediately if the queue is empty. Runs before any trigger
    /// starts, so the batch is queued ahead of the first drain tick.
    pub async fn prime(&self) -> Option<RefillOutcome> {
        match self.ctx.queue().len().await {
            Ok(0) => {
                info!("Queue empty at startup, refilling now");
                Some(self.ctx.refill().await)
            }
            Ok(pending) => {
                info!(pending, "Queue has pending posts");
                None
            }
            Err(e) => {
                error!(error = %e, "Failed to read queue at startup");
                None
            }
        }
    }

    /// Spawn all triggers
    pub fn start(&mut self) {
        for trigger in Trigger::ALL {
            let ctx = Arc::clone(&self.ctx);
            let period = trigger.period(&ctx);
            info!(trigger = trigger.name(), ?period, "Starting trigger");

            self.tasks.spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    ticker.tick().await;
                    trigger.fire(&ctx).await;
                }
            });
        }
    }

    /// Prime, start, and run until a trigger task dies.
    ///
    /// Triggers loop forever, so returning at all means something broke.
    pub async fn run(mut self) -> Result<()> {
        self.prime().await;
        self.start();

        match self.tasks.join_next().await {
            Some(Ok(())) => anyhow::bail!("A trigger stopped"),
            Some(Err(e)) => anyhow::bail!("Trigger task failed: {}", e),
            None => anyhow::bail!("No triggers running"),
        }
    }
}
