// Automation engine - the per-tick driver
//
// One tick fetches the full lead set, then walks leads x active rules
// sequentially: per-lead execution is serialized and rules apply in
// catalog declaration order, so two rules can never race on one lead's
// stage within a tick.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::evaluator::rule_matches;
use super::executor::ActionExecutor;
use super::rules::{RuleCatalog, TriggerType};
use crate::config::LinkConfig;
use crate::error::AutomationResult;
use crate::storage::{LeadStore, NotificationSender};

/// Counters and per-pair errors for one tick.
#[derive(Debug, Default)]
pub struct TickResult {
    pub leads_scanned: usize,
    pub rules_matched: usize,
    pub notifications_sent: usize,
    pub tasks_created: usize,
    pub stages_changed: usize,
    pub errors: Vec<String>,
}

pub struct AutomationEngine {
    store: Arc<dyn LeadStore>,
    catalog: RuleCatalog,
    executor: ActionExecutor,
}

impl AutomationEngine {
    pub fn new(
        store: Arc<dyn LeadStore>,
        sender: Arc<dyn NotificationSender>,
        catalog: RuleCatalog,
        links: LinkConfig,
    ) -> Self {
        let executor = ActionExecutor::new(store.clone(), sender, links);
        Self { store, catalog, executor }
    }

    /// Run one evaluation pass over the whole lead set.
    ///
    /// A failed lead fetch aborts the tick (the scheduler retries on the
    /// next fire); everything below that is per-pair best-effort.
    pub async fn run_tick(&self) -> AutomationResult<TickResult> {
        let mut result = TickResult::default();
        let now = Utc::now();

        let leads = self.store.fetch_all_leads().await?;
        result.leads_scanned = leads.len();

        for lead in &leads {
            for rule in self.catalog.active_rules() {
                let matched = match rule_matches(rule, lead, now) {
                    Ok(matched) => matched,
                    Err(e) => {
                        warn!("Skipping rule '{}' for lead {}: {}", rule.id, lead.id, e);
                        result.errors.push(e.to_string());
                        continue;
                    }
                };
                if !matched {
                    continue;
                }

                // Stage-presence rules are level-triggered and would re-fire
                // every tick; gate them on the follow-up log so the welcome
                // sequence runs once per lead.
                if rule.trigger == TriggerType::StageChange {
                    match self.store.rule_has_fired(&rule.id, &lead.id).await {
                        Ok(true) => continue,
                        Ok(false) => {}
                        Err(e) => {
                            result.errors.push(format!(
                                "fire-once check failed for rule '{}', lead {}: {}",
                                rule.id, lead.id, e
                            ));
                            continue;
                        }
                    }
                }

                result.rules_matched += 1;
                let outcome = self.executor.execute(rule, lead, now).await;

                if outcome.notification_sent {
                    result.notifications_sent += 1;
                }
                if outcome.task_created.is_some() {
                    result.tasks_created += 1;
                }
                if outcome.stage_changed.is_some() {
                    result.stages_changed += 1;
                }
                result.errors.extend(outcome.errors);
            }
        }

        info!(
            "Tick complete: {} leads scanned, {} rules matched, {} notifications, {} tasks, {} stage changes, {} errors",
            result.leads_scanned,
            result.rules_matched,
            result.notifications_sent,
            result.tasks_created,
            result.stages_changed,
            result.errors.len()
        );

        Ok(result)
    }
}
