// Follow-up rule catalog
//
// Rules are declarative: a trigger kind, the conditions meaningful for that
// kind, and the actions to run on a match. The catalog is fixed at process
// start; a rule whose conditions do not fit its trigger is a configuration
// error and construction fails fast.

use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, AutomationResult};
use crate::models::{LeadStage, PropertyType, TaskPriority};
use crate::templates;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    StageChange,
    TimeBased,
    Inactivity,
    PropertyMatch,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConditions {
    pub stage: Option<LeadStage>,
    pub days_since: Option<i64>,
    pub inactivity_days: Option<i64>,
    pub property_type: Option<PropertyType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleActions {
    pub send_notification: bool,
    pub template: Option<String>,
    pub create_task: bool,
    pub change_stage: Option<LeadStage>,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRule {
    pub id: String,
    pub name: String,
    pub trigger: TriggerType,
    pub conditions: RuleConditions,
    pub actions: RuleActions,
    pub active: bool,
}

impl FollowUpRule {
    pub fn new(id: &str, name: &str, trigger: TriggerType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            trigger,
            conditions: RuleConditions::default(),
            actions: RuleActions::default(),
            active: true,
        }
    }

    // ===== Condition builders =====

    pub fn when_stage(mut self, stage: LeadStage) -> Self {
        self.conditions.stage = Some(stage);
        self
    }

    pub fn after_days(mut self, days: i64) -> Self {
        self.conditions.days_since = Some(days);
        self
    }

    pub fn after_inactivity_days(mut self, days: i64) -> Self {
        self.conditions.inactivity_days = Some(days);
        self
    }

    pub fn for_property_type(mut self, property_type: PropertyType) -> Self {
        self.conditions.property_type = Some(property_type);
        self
    }

    // ===== Action builders =====

    pub fn notify(mut self, template: &str) -> Self {
        self.actions.send_notification = true;
        self.actions.template = Some(template.to_string());
        self
    }

    pub fn create_task(mut self) -> Self {
        self.actions.create_task = true;
        self
    }

    pub fn set_stage(mut self, stage: LeadStage) -> Self {
        self.actions.change_stage = Some(stage);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.actions.priority = Some(priority);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check that exactly the condition fields meaningful for the trigger
    /// kind are present.
    pub fn validate(&self) -> AutomationResult<()> {
        let c = &self.conditions;
        let fail = |msg: &str| {
            Err(AutomationError::Config(format!(
                "rule '{}': {}",
                self.id, msg
            )))
        };

        match self.trigger {
            TriggerType::StageChange => {
                if c.stage.is_none() {
                    return fail("stage_change trigger requires a stage condition");
                }
                if c.days_since.is_some() || c.inactivity_days.is_some() || c.property_type.is_some() {
                    return fail("stage_change trigger accepts only a stage condition");
                }
            }
            TriggerType::TimeBased => {
                if c.days_since.is_none() {
                    return fail("time_based trigger requires days_since");
                }
                if c.stage.is_some() || c.inactivity_days.is_some() || c.property_type.is_some() {
                    return fail("time_based trigger accepts only days_since");
                }
                if c.days_since.is_some_and(|d| d < 0) {
                    return fail("days_since must be non-negative");
                }
            }
            TriggerType::Inactivity => {
                if c.inactivity_days.is_none() {
                    return fail("inactivity trigger requires inactivity_days");
                }
                if c.days_since.is_some() || c.property_type.is_some() {
                    return fail("inactivity trigger accepts only inactivity_days and an optional stage");
                }
                if c.inactivity_days.is_some_and(|d| d < 1) {
                    return fail("inactivity_days must be at least 1");
                }
            }
            TriggerType::PropertyMatch => {
                if c.property_type.is_none() {
                    return fail("property_match trigger requires property_type");
                }
                if c.stage.is_some() || c.days_since.is_some() || c.inactivity_days.is_some() {
                    return fail("property_match trigger accepts only property_type");
                }
            }
        }

        Ok(())
    }
}

/// The ordered set of follow-up rules. Declaration order is evaluation
/// order, deterministic for the process lifetime.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<FollowUpRule>,
}

impl RuleCatalog {
    /// Build a catalog from explicit rules, failing fast on the first
    /// malformed one.
    pub fn new(rules: Vec<FollowUpRule>) -> AutomationResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// The built-in marketplace follow-up sequence.
    pub fn builtin() -> AutomationResult<Self> {
        Self::new(vec![
            FollowUpRule::new("new-lead-welcome", "New lead welcome call", TriggerType::StageChange)
                .when_stage(LeadStage::Lead)
                .notify(templates::WELCOME_NEW_LEAD)
                .create_task()
                .with_priority(TaskPriority::High),
            FollowUpRule::new("first-day-follow-up", "First day follow-up", TriggerType::TimeBased)
                .after_days(1)
                .notify(templates::CONTACT_FOLLOW_UP),
            FollowUpRule::new("qualification-reminder", "Qualification reminder call", TriggerType::Inactivity)
                .after_inactivity_days(3)
                .when_stage(LeadStage::Contacted)
                .notify(templates::QUALIFICATION_REMINDER)
                .create_task(),
            FollowUpRule::new("negotiation-push", "Negotiation push call", TriggerType::Inactivity)
                .after_inactivity_days(7)
                .when_stage(LeadStage::Negotiating)
                .notify(templates::NEGOTIATION_PUSH)
                .create_task()
                .with_priority(TaskPriority::Urgent),
            FollowUpRule::new("lost-lead-reactivation", "Lost lead reactivation", TriggerType::TimeBased)
                .after_days(30)
                .notify(templates::REACTIVATION_OFFER)
                .set_stage(LeadStage::Lead),
            FollowUpRule::new("apartment-interest-call", "Apartment interest call", TriggerType::PropertyMatch)
                .for_property_type(PropertyType::Apartment)
                .create_task(),
        ])
    }

    /// Active rules in declaration order.
    pub fn active_rules(&self) -> impl Iterator<Item = &FollowUpRule> {
        self.rules.iter().filter(|r| r.active)
    }

    pub fn rules(&self) -> &[FollowUpRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(catalog.rules().len(), 6);
        assert_eq!(catalog.active_rules().count(), 6);
    }

    #[test]
    fn test_active_rules_keep_declaration_order() {
        let catalog = RuleCatalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.active_rules().map(|r| r.id.as_str()).collect();
        assert_eq!(ids[0], "new-lead-welcome");
        assert_eq!(ids[4], "lost-lead-reactivation");
    }

    #[test]
    fn test_inactive_rules_are_filtered() {
        let catalog = RuleCatalog::new(vec![
            FollowUpRule::new("a", "A", TriggerType::TimeBased).after_days(1),
            FollowUpRule::new("b", "B", TriggerType::TimeBased)
                .after_days(2)
                .inactive(),
        ])
        .unwrap();

        let ids: Vec<&str> = catalog.active_rules().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_time_based_rule_requires_days_since() {
        let result = RuleCatalog::new(vec![FollowUpRule::new(
            "broken",
            "Broken",
            TriggerType::TimeBased,
        )]);
        assert!(matches!(result, Err(AutomationError::Config(_))));
    }

    #[test]
    fn test_inactivity_rule_rejects_foreign_conditions() {
        let rule = FollowUpRule::new("mixed", "Mixed", TriggerType::Inactivity)
            .after_inactivity_days(3)
            .after_days(1);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_stage_change_rule_requires_stage() {
        let rule = FollowUpRule::new("no-stage", "No stage", TriggerType::StageChange);
        assert!(rule.validate().is_err());
    }
}
