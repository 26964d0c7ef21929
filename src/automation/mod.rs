// Follow-up automation
//
// Declarative rules evaluated against the lead dataset on a periodic tick,
// firing templated notifications, follow-up tasks, and stage transitions.

pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod rules;

pub use engine::{AutomationEngine, TickResult};
pub use evaluator::rule_matches;
pub use executor::{ActionExecutor, ExecutionOutcome};
pub use rules::{FollowUpRule, RuleActions, RuleCatalog, RuleConditions, TriggerType};
