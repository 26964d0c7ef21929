// Error types for the follow-up automation engine

use thiserror::Error;

use crate::models::LeadStage;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Rule configuration error: {0}")]
    Config(String),
    #[error("Evaluation error: {0}")]
    Evaluation(String),
    #[error("Unknown lead stage: {0}")]
    InvalidStage(String),
    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: LeadStage, to: LeadStage },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

pub type AutomationResult<T> = Result<T, AutomationError>;
