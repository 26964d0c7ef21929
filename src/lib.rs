// Leadflow - follow-up automation and lead lifecycle engine
//
// A periodic batch job for the marketplace backend: evaluates declarative
// follow-up rules against the lead dataset and performs templated email
// notifications, task creation, and stage transitions, with an append-only
// audit log of every execution.

pub mod automation;
pub mod config;
pub mod database;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod storage;
pub mod templates;

pub use automation::{AutomationEngine, RuleCatalog, TickResult};
pub use config::Config;
pub use error::{AutomationError, AutomationResult};
pub use jobs::AutomationScheduler;
