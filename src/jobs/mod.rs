pub mod scheduler;

pub use scheduler::AutomationScheduler;
