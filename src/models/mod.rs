// Domain model for the follow-up automation engine

pub mod lead;
pub mod task;

pub use lead::{AgentContact, Lead, LeadStage, PropertySnapshot, PropertyType};
pub use task::{FollowUpLog, FollowUpTask, TaskPriority, TaskStatus, TaskType};
