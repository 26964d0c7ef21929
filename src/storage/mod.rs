// Storage and notification capabilities consumed by the engine

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::{MemoryStore, RecordedMessage, RecordingSender};
pub use postgres::PostgresStore;
pub use traits::{LeadStore, NotificationSender};
