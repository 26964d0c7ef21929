// Capability traits for persistence and outbound notifications
//
// The engine never owns lead or task storage; every mutation goes through
// a single atomic call on these traits so concurrent CRM edits are not
// clobbered by read-modify-write cycles.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AutomationResult;
use crate::models::{FollowUpLog, FollowUpTask, Lead, LeadStage};

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Full scan of the lead set, used once per tick.
    async fn fetch_all_leads(&self) -> AutomationResult<Vec<Lead>>;

    /// Atomically set the lifecycle stage of one lead.
    async fn update_lead_stage(&self, lead_id: &str, stage: LeadStage) -> AutomationResult<()>;

    async fn insert_task(&self, task: &FollowUpTask) -> AutomationResult<()>;

    /// Append one execution log row. Never updated or deleted.
    async fn insert_log(&self, log: &FollowUpLog) -> AutomationResult<()>;

    /// Whether a rule has ever executed for a lead, per the follow-up log.
    async fn rule_has_fired(&self, rule_id: &str, lead_id: &str) -> AutomationResult<bool>;

    /// Pending tasks for an agent, ordered by priority desc then
    /// scheduled time asc.
    async fn list_agent_pending_tasks(&self, agent_id: &str) -> AutomationResult<Vec<FollowUpTask>>;

    /// Mark a pending task completed and stamp `completed_at`. Calling it
    /// again is a state-wise no-op; cancelled tasks are never resurrected.
    async fn complete_task(&self, task_id: Uuid) -> AutomationResult<()>;
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AutomationResult<()>;
}
