// In-memory store, used by the test suite and for embedding the engine
// without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::traits::{LeadStore, NotificationSender};
use crate::error::AutomationResult;
use crate::models::{FollowUpLog, FollowUpTask, Lead, LeadStage, TaskStatus};

#[derive(Debug, Default)]
struct Inner {
    leads: Vec<Lead>,
    tasks: Vec<FollowUpTask>,
    logs: Vec<FollowUpLog>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_lead(&self, lead: Lead) {
        self.inner.lock().await.leads.push(lead);
    }

    pub async fn lead(&self, lead_id: &str) -> Option<Lead> {
        self.inner
            .lock()
            .await
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .cloned()
    }

    pub async fn tasks(&self) -> Vec<FollowUpTask> {
        self.inner.lock().await.tasks.clone()
    }

    pub async fn logs(&self) -> Vec<FollowUpLog> {
        self.inner.lock().await.logs.clone()
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn fetch_all_leads(&self) -> AutomationResult<Vec<Lead>> {
        Ok(self.inner.lock().await.leads.clone())
    }

    async fn update_lead_stage(&self, lead_id: &str, stage: LeadStage) -> AutomationResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(lead) = inner.leads.iter_mut().find(|l| l.id == lead_id) {
            lead.stage = stage;
        }
        Ok(())
    }

    async fn insert_task(&self, task: &FollowUpTask) -> AutomationResult<()> {
        self.inner.lock().await.tasks.push(task.clone());
        Ok(())
    }

    async fn insert_log(&self, log: &FollowUpLog) -> AutomationResult<()> {
        self.inner.lock().await.logs.push(log.clone());
        Ok(())
    }

    async fn rule_has_fired(&self, rule_id: &str, lead_id: &str) -> AutomationResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .logs
            .iter()
            .any(|log| log.rule_id == rule_id && log.lead_id == lead_id))
    }

    async fn list_agent_pending_tasks(&self, agent_id: &str) -> AutomationResult<Vec<FollowUpTask>> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<FollowUpTask> = inner
            .tasks
            .iter()
            .filter(|t| t.agent_id == agent_id && t.status == TaskStatus::Pending)
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then(a.scheduled_at.cmp(&b.scheduled_at))
        });

        Ok(tasks)
    }

    async fn complete_task(&self, task_id: Uuid) -> AutomationResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.tasks.iter_mut().find(|t| t.id == task_id) {
            match task.status {
                TaskStatus::Pending => {
                    task.status = TaskStatus::Completed;
                    task.completed_at = Some(Utc::now());
                }
                // Re-completing is a no-op; cancelled tasks stay cancelled.
                TaskStatus::Completed | TaskStatus::Cancelled => {}
            }
        }
        Ok(())
    }
}

/// Sender that records rendered messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<RecordedMessage>>>,
}

#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<RecordedMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AutomationResult<()> {
        self.sent.lock().await.push(RecordedMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}
