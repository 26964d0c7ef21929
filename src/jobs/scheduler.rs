// Automation scheduler - owns the timer driving the rule engine
//
// Explicitly constructed, started, and shut down by the host process.
// Ticks run on a fixed cron interval with one eager run at startup; a
// tick that is still running when the timer fires again is skipped, not
// queued, since store writes are not safe under overlapping ticks.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioScheduler};
use tracing::{error, info, warn};

use crate::automation::{AutomationEngine, TickResult};
use crate::config::AutomationConfig;
use crate::error::AutomationResult;

pub struct AutomationScheduler {
    scheduler: TokioScheduler,
    engine: Arc<AutomationEngine>,
    tick_interval_hours: u32,
    run_on_startup: bool,
    tick_guard: Arc<Mutex<()>>,
}

impl AutomationScheduler {
    pub async fn new(engine: Arc<AutomationEngine>, config: &AutomationConfig) -> AutomationResult<Self> {
        let scheduler = TokioScheduler::new().await?;

        Ok(Self {
            scheduler,
            engine,
            tick_interval_hours: config.tick_interval_hours.max(1),
            run_on_startup: config.run_on_startup,
            tick_guard: Arc::new(Mutex::new(())),
        })
    }

    pub async fn start(&self) -> AutomationResult<()> {
        info!(
            "Starting follow-up automation scheduler (every {} hour(s))",
            self.tick_interval_hours
        );

        if self.run_on_startup {
            run_tick_guarded(self.engine.clone(), self.tick_guard.clone()).await;
        }

        let cron_expr = format!("0 0 */{} * * *", self.tick_interval_hours);
        let engine = self.engine.clone();
        let guard = self.tick_guard.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let engine = engine.clone();
            let guard = guard.clone();

            Box::pin(async move {
                run_tick_guarded(engine, guard).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        info!("Follow-up automation scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> AutomationResult<()> {
        info!("Shutting down follow-up automation scheduler");
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Trigger a tick outside the timer, waiting for any running tick to
    /// finish first.
    pub async fn run_now(&self) -> AutomationResult<TickResult> {
        let _held = self.tick_guard.lock().await;
        self.engine.run_tick().await
    }
}

async fn run_tick_guarded(engine: Arc<AutomationEngine>, guard: Arc<Mutex<()>>) {
    let Ok(_held) = guard.try_lock() else {
        warn!("Previous automation tick still running, skipping this fire");
        return;
    };

    match engine.run_tick().await {
        Ok(result) => {
            if !result.errors.is_empty() {
                warn!(
                    "Automation tick finished with {} error(s): {:?}",
                    result.errors.len(),
                    result.errors
                );
            }
        }
        Err(e) => {
            // Lead fetch failed; nothing was evaluated. Retried next fire.
            error!("Automation tick failed: {}", e);
        }
    }
}
