// Action executor - applies a matched rule's actions to one lead
//
// Every step is best-effort: a failed send never blocks task creation, a
// failed insert never blocks the stage change, and the audit log row is
// attempted regardless of what came before it.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::rules::FollowUpRule;
use crate::config::LinkConfig;
use crate::error::AutomationError;
use crate::models::{FollowUpLog, FollowUpTask, Lead, LeadStage, TaskPriority, TaskStatus, TaskType};
use crate::storage::{LeadStore, NotificationSender};
use crate::templates::{self, TemplateVars};

const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// What happened when a rule executed against a lead. Step failures are
/// collected here and reported by the driver; they are never fatal.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub rule_id: String,
    pub lead_id: String,
    pub notification_sent: bool,
    pub task_created: Option<Uuid>,
    pub stage_changed: Option<LeadStage>,
    pub logged: bool,
    pub errors: Vec<String>,
}

pub struct ActionExecutor {
    store: Arc<dyn LeadStore>,
    sender: Arc<dyn NotificationSender>,
    links: LinkConfig,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<dyn LeadStore>,
        sender: Arc<dyn NotificationSender>,
        links: LinkConfig,
    ) -> Self {
        Self { store, sender, links }
    }

    /// Run the rule's configured actions against one lead.
    pub async fn execute(
        &self,
        rule: &FollowUpRule,
        lead: &Lead,
        now: DateTime<Utc>,
    ) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome {
            rule_id: rule.id.clone(),
            lead_id: lead.id.clone(),
            ..Default::default()
        };

        info!("Executing rule '{}' for lead {}", rule.id, lead.id);

        // Step 1: notification
        if rule.actions.send_notification {
            if let Some(template_id) = &rule.actions.template {
                match templates::find_template(template_id) {
                    Some(template) => {
                        let vars = TemplateVars::for_lead(lead, &self.links);
                        let rendered = templates::render(template, &vars);

                        let send = self.sender.send(&lead.email, &rendered.subject, &rendered.html_body);
                        match tokio::time::timeout(SEND_TIMEOUT, send).await {
                            Ok(Ok(())) => outcome.notification_sent = true,
                            Ok(Err(e)) => outcome
                                .errors
                                .push(format!("notification to {} failed: {}", lead.email, e)),
                            Err(_) => outcome
                                .errors
                                .push(format!("notification to {} timed out", lead.email)),
                        }
                    }
                    // Missing template is a no-op, not an error.
                    None => debug!("Rule '{}' references unknown template '{}'", rule.id, template_id),
                }
            }
        }

        // Step 2: follow-up task
        if rule.actions.create_task {
            let task = self.build_task(rule, lead, now);
            match self.store.insert_task(&task).await {
                Ok(()) => outcome.task_created = Some(task.id),
                Err(e) => outcome.errors.push(format!("task insert failed: {}", e)),
            }
        }

        // Step 3: stage transition, validated against the transition table
        if let Some(target) = rule.actions.change_stage {
            if lead.stage == target {
                debug!("Lead {} already in stage {}", lead.id, target);
            } else if !lead.stage.can_transition(target) {
                let err = AutomationError::InvalidTransition { from: lead.stage, to: target };
                outcome.errors.push(err.to_string());
            } else {
                match self.store.update_lead_stage(&lead.id, target).await {
                    Ok(()) => outcome.stage_changed = Some(target),
                    Err(e) => outcome.errors.push(format!("stage update failed: {}", e)),
                }
            }
        }

        // Step 4: audit log, always attempted
        let log = FollowUpLog {
            rule_id: rule.id.clone(),
            lead_id: lead.id.clone(),
            action: describe_actions(&outcome),
            executed_at: now,
        };
        match self.store.insert_log(&log).await {
            Ok(()) => outcome.logged = true,
            Err(e) => outcome.errors.push(format!("audit log insert failed: {}", e)),
        }

        if !outcome.errors.is_empty() {
            warn!(
                "Rule '{}' for lead {} completed with {} error(s)",
                rule.id,
                lead.id,
                outcome.errors.len()
            );
        }

        outcome
    }

    fn build_task(&self, rule: &FollowUpRule, lead: &Lead, now: DateTime<Utc>) -> FollowUpTask {
        FollowUpTask {
            id: Uuid::new_v4(),
            lead_id: lead.id.clone(),
            task_type: task_type_for_rule(&rule.name),
            subject: format!("{}: {}", rule.name, lead.name),
            description: format!(
                "Automated follow-up for {} <{}> triggered by rule '{}'",
                lead.name, lead.email, rule.id
            ),
            scheduled_at: now + Duration::hours(24),
            priority: rule.actions.priority.unwrap_or(TaskPriority::Medium),
            status: TaskStatus::Pending,
            agent_id: lead.agent.id.clone(),
            created_at: now,
            completed_at: None,
        }
    }
}

/// Task kind derived from the rule name, matching the source heuristic.
fn task_type_for_rule(rule_name: &str) -> TaskType {
    if rule_name.to_lowercase().contains("call") {
        TaskType::Call
    } else {
        TaskType::Email
    }
}

fn describe_actions(outcome: &ExecutionOutcome) -> String {
    let mut parts = Vec::new();
    if outcome.notification_sent {
        parts.push("notified".to_string());
    }
    if outcome.task_created.is_some() {
        parts.push("task_created".to_string());
    }
    if let Some(stage) = outcome.stage_changed {
        parts.push(format!("stage_set:{}", stage));
    }
    if parts.is_empty() {
        "no_op".to_string()
    } else {
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::rules::TriggerType;
    use crate::models::AgentContact;
    use crate::storage::{MemoryStore, RecordingSender};

    fn links() -> LinkConfig {
        LinkConfig {
            website_url: "https://homes.example".to_string(),
            calendar_link: "https://homes.example/book".to_string(),
            similar_properties_link: "https://homes.example/properties?similar=1".to_string(),
            new_properties_link: "https://homes.example/properties?sort=newest".to_string(),
            new_properties_count: String::new(),
        }
    }

    fn lead(stage: LeadStage) -> Lead {
        Lead {
            id: "lead-1".to_string(),
            name: "Sarah".to_string(),
            email: "sarah@example.com".to_string(),
            phone: None,
            agent: AgentContact {
                id: "agent-1".to_string(),
                name: "Mark".to_string(),
                email: "mark@example.com".to_string(),
                phone: None,
            },
            stage,
            created_at: Utc::now(),
            last_contact: None,
            property: None,
        }
    }

    fn executor(store: &MemoryStore, sender: &RecordingSender) -> ActionExecutor {
        ActionExecutor::new(Arc::new(store.clone()), Arc::new(sender.clone()), links())
    }

    #[tokio::test]
    async fn test_task_type_derived_from_rule_name() {
        let store = MemoryStore::new();
        let sender = RecordingSender::new();
        let exec = executor(&store, &sender);

        let rule = FollowUpRule::new("r1", "Qualification reminder call", TriggerType::Inactivity)
            .after_inactivity_days(3)
            .create_task();
        exec.execute(&rule, &lead(LeadStage::Contacted), Utc::now()).await;

        let tasks = store.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type, TaskType::Call);
        assert_eq!(tasks[0].priority, TaskPriority::Medium);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_template_is_a_no_op() {
        let store = MemoryStore::new();
        let sender = RecordingSender::new();
        let exec = executor(&store, &sender);

        let rule = FollowUpRule::new("r1", "Ghost", TriggerType::StageChange)
            .when_stage(LeadStage::Lead)
            .notify("no-such-template");
        let outcome = exec.execute(&rule, &lead(LeadStage::Lead), Utc::now()).await;

        assert!(!outcome.notification_sent);
        assert!(outcome.errors.is_empty());
        assert!(sender.sent().await.is_empty());
        // Audit log still written.
        assert_eq!(store.logs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_a_step_error_not_a_write() {
        let store = MemoryStore::new();
        let sender = RecordingSender::new();
        let exec = executor(&store, &sender);

        let target = lead(LeadStage::Negotiating);
        store.add_lead(target.clone()).await;

        let rule = FollowUpRule::new("reactivate", "Reactivation", TriggerType::TimeBased)
            .after_days(30)
            .set_stage(LeadStage::Lead);
        let outcome = exec.execute(&rule, &target, Utc::now()).await;

        assert!(outcome.stage_changed.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(store.lead("lead-1").await.unwrap().stage, LeadStage::Negotiating);
        // The log row is still appended.
        assert!(outcome.logged);
    }

    #[tokio::test]
    async fn test_audit_log_is_never_deduplicated() {
        let store = MemoryStore::new();
        let sender = RecordingSender::new();
        let exec = executor(&store, &sender);

        let rule = FollowUpRule::new("r1", "Welcome", TriggerType::StageChange)
            .when_stage(LeadStage::Lead);
        let target = lead(LeadStage::Lead);

        exec.execute(&rule, &target, Utc::now()).await;
        exec.execute(&rule, &target, Utc::now()).await;

        assert_eq!(store.logs().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reactivation_moves_lost_lead_back_to_lead() {
        let store = MemoryStore::new();
        let sender = RecordingSender::new();
        let exec = executor(&store, &sender);

        let target = lead(LeadStage::Lost);
        store.add_lead(target.clone()).await;

        let rule = FollowUpRule::new("lost-lead-reactivation", "Lost lead reactivation", TriggerType::TimeBased)
            .after_days(30)
            .notify(crate::templates::REACTIVATION_OFFER)
            .set_stage(LeadStage::Lead);
        let outcome = exec.execute(&rule, &target, Utc::now()).await;

        assert_eq!(outcome.stage_changed, Some(LeadStage::Lead));
        assert_eq!(store.lead("lead-1").await.unwrap().stage, LeadStage::Lead);
        assert_eq!(sender.sent().await.len(), 1);
        assert_eq!(sender.sent().await[0].to, "sarah@example.com");
    }
}
