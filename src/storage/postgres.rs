// Postgres-backed lead store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::traits::LeadStore;
use crate::error::AutomationResult;
use crate::models::{
    AgentContact, FollowUpLog, FollowUpTask, Lead, LeadStage, PropertySnapshot, PropertyType,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct LeadRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    stage: LeadStage,
    created_at: DateTime<Utc>,
    last_contact: Option<DateTime<Utc>>,
    agent_id: String,
    agent_name: String,
    agent_email: String,
    agent_phone: Option<String>,
    property_id: Option<String>,
    property_title: Option<String>,
    property_location: Option<String>,
    property_price: Option<Decimal>,
    property_type: Option<PropertyType>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
}

impl LeadRow {
    fn into_lead(self) -> Lead {
        let property = match (
            self.property_id,
            self.property_title,
            self.property_location,
            self.property_price,
            self.property_type,
        ) {
            (Some(id), Some(title), Some(location), Some(price), Some(property_type)) => {
                Some(PropertySnapshot {
                    id,
                    title,
                    location,
                    price,
                    property_type,
                    bedrooms: self.bedrooms.unwrap_or(0),
                    bathrooms: self.bathrooms.unwrap_or(0),
                })
            }
            _ => None,
        };

        Lead {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            agent: AgentContact {
                id: self.agent_id,
                name: self.agent_name,
                email: self.agent_email,
                phone: self.agent_phone,
            },
            stage: self.stage,
            created_at: self.created_at,
            last_contact: self.last_contact,
            property,
        }
    }
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PostgresStore {
    async fn fetch_all_leads(&self) -> AutomationResult<Vec<Lead>> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT
                l.id,
                l.name,
                l.email,
                l.phone,
                l.stage,
                l.created_at,
                l.last_contact,
                a.id as agent_id,
                a.name as agent_name,
                a.email as agent_email,
                a.phone as agent_phone,
                p.id as property_id,
                p.title as property_title,
                p.location as property_location,
                p.price as property_price,
                p.property_type,
                p.bedrooms,
                p.bathrooms
            FROM leads l
            JOIN agents a ON l.agent_id = a.id
            LEFT JOIN properties p ON l.property_id = p.id
            ORDER BY l.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeadRow::into_lead).collect())
    }

    async fn update_lead_stage(&self, lead_id: &str, stage: LeadStage) -> AutomationResult<()> {
        sqlx::query("UPDATE leads SET stage = $2, updated_at = NOW() WHERE id = $1")
            .bind(lead_id)
            .bind(stage)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_task(&self, task: &FollowUpTask) -> AutomationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO follow_up_tasks
            (id, lead_id, task_type, subject, description, scheduled_at, priority, status, agent_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(&task.lead_id)
        .bind(task.task_type)
        .bind(&task.subject)
        .bind(&task.description)
        .bind(task.scheduled_at)
        .bind(task.priority)
        .bind(task.status)
        .bind(&task.agent_id)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_log(&self, log: &FollowUpLog) -> AutomationResult<()> {
        sqlx::query(
            "INSERT INTO follow_up_logs (rule_id, lead_id, action, executed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&log.rule_id)
        .bind(&log.lead_id)
        .bind(&log.action)
        .bind(log.executed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rule_has_fired(&self, rule_id: &str, lead_id: &str) -> AutomationResult<bool> {
        let fired: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follow_up_logs WHERE rule_id = $1 AND lead_id = $2)",
        )
        .bind(rule_id)
        .bind(lead_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(fired)
    }

    async fn list_agent_pending_tasks(&self, agent_id: &str) -> AutomationResult<Vec<FollowUpTask>> {
        let tasks = sqlx::query_as::<_, FollowUpTask>(
            r#"
            SELECT id, lead_id, task_type, subject, description, scheduled_at,
                   priority, status, agent_id, created_at, completed_at
            FROM follow_up_tasks
            WHERE agent_id = $1 AND status = 'pending'
            ORDER BY
                CASE priority
                    WHEN 'urgent' THEN 1
                    WHEN 'high' THEN 2
                    WHEN 'medium' THEN 3
                    WHEN 'low' THEN 4
                    ELSE 5
                END,
                scheduled_at ASC
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn complete_task(&self, task_id: Uuid) -> AutomationResult<()> {
        sqlx::query(
            r#"
            UPDATE follow_up_tasks
            SET status = 'completed',
                completed_at = COALESCE(completed_at, NOW())
            WHERE id = $1 AND status <> 'cancelled'
            "#,
        )
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
