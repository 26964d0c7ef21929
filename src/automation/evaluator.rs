// Rule evaluator - pure trigger predicates, no I/O
//
// Trigger semantics:
//   stage_change   - level-triggered: true while the lead sits in the stage
//   time_based     - exact-day match against lead age (not a threshold)
//   inactivity     - threshold on days since last contact, optionally
//                    scoped to one stage
//   property_match - equality on the linked listing's type

use chrono::{DateTime, Utc};

use super::rules::{FollowUpRule, TriggerType};
use crate::error::{AutomationError, AutomationResult};
use crate::models::Lead;

/// Decide whether `rule` fires for `lead` at instant `now`.
///
/// Condition fields missing for the trigger kind produce an error rather
/// than a silent non-match; the catalog rejects such rules at startup, so
/// hitting one here means the rule set was built outside the catalog.
pub fn rule_matches(rule: &FollowUpRule, lead: &Lead, now: DateTime<Utc>) -> AutomationResult<bool> {
    match rule.trigger {
        TriggerType::StageChange => {
            let stage = rule.conditions.stage.ok_or_else(|| missing(rule, "stage"))?;
            Ok(lead.stage == stage)
        }
        TriggerType::TimeBased => {
            let target = rule
                .conditions
                .days_since
                .ok_or_else(|| missing(rule, "days_since"))?;
            Ok(days_between(lead.created_at, now) == target)
        }
        TriggerType::Inactivity => {
            let threshold = rule
                .conditions
                .inactivity_days
                .ok_or_else(|| missing(rule, "inactivity_days"))?;

            if let Some(stage) = rule.conditions.stage {
                if lead.stage != stage {
                    return Ok(false);
                }
            }

            Ok(days_between(lead.last_contact_or_created(), now) >= threshold)
        }
        TriggerType::PropertyMatch => {
            let wanted = rule
                .conditions
                .property_type
                .ok_or_else(|| missing(rule, "property_type"))?;
            Ok(lead.property_type() == Some(wanted))
        }
    }
}

/// Whole days elapsed from `from` to `now`, truncated toward zero.
fn days_between(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_days()
}

fn missing(rule: &FollowUpRule, field: &str) -> AutomationError {
    AutomationError::Evaluation(format!(
        "rule '{}' is missing required condition '{}'",
        rule.id, field
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::rules::TriggerType;
    use crate::models::{AgentContact, LeadStage, PropertySnapshot, PropertyType};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn lead_at(stage: LeadStage, created_ago: Duration, now: DateTime<Utc>) -> Lead {
        Lead {
            id: "lead-1".to_string(),
            name: "Sarah".to_string(),
            email: "sarah@example.com".to_string(),
            phone: None,
            agent: AgentContact {
                id: "agent-1".to_string(),
                name: "Mark".to_string(),
                email: "mark@example.com".to_string(),
                phone: None,
            },
            stage,
            created_at: now - created_ago,
            last_contact: None,
            property: None,
        }
    }

    #[test]
    fn test_time_based_fires_only_on_exact_day() {
        let now = Utc::now();
        let rule = FollowUpRule::new("d1", "Day one", TriggerType::TimeBased).after_days(1);

        // 24h01m old: floor(days) == 1, fires
        let lead = lead_at(LeadStage::Lead, Duration::hours(24) + Duration::minutes(1), now);
        assert!(rule_matches(&rule, &lead, now).unwrap());

        // 23h59m old: floor(days) == 0, does not fire
        let lead = lead_at(LeadStage::Lead, Duration::hours(23) + Duration::minutes(59), now);
        assert!(!rule_matches(&rule, &lead, now).unwrap());

        // two days old: missed the exact-day window, never fires again
        let lead = lead_at(LeadStage::Lead, Duration::days(2) + Duration::minutes(1), now);
        assert!(!rule_matches(&rule, &lead, now).unwrap());
    }

    #[test]
    fn test_inactivity_is_monotonic_once_crossed() {
        let now = Utc::now();
        let rule =
            FollowUpRule::new("inact", "Inactivity", TriggerType::Inactivity).after_inactivity_days(3);

        let lead = lead_at(LeadStage::Qualified, Duration::days(4), now);
        assert!(rule_matches(&rule, &lead, now).unwrap());
        // Still fires an hour later as long as last_contact is untouched.
        assert!(rule_matches(&rule, &lead, now + Duration::hours(1)).unwrap());
    }

    #[test]
    fn test_inactivity_respects_stage_scope() {
        let now = Utc::now();
        let rule = FollowUpRule::new("push", "Negotiation push", TriggerType::Inactivity)
            .after_inactivity_days(7)
            .when_stage(LeadStage::Negotiating);

        let lead = lead_at(LeadStage::Qualified, Duration::days(10), now);
        assert!(!rule_matches(&rule, &lead, now).unwrap());

        let lead = lead_at(LeadStage::Negotiating, Duration::days(10), now);
        assert!(rule_matches(&rule, &lead, now).unwrap());
    }

    #[test]
    fn test_inactivity_uses_last_contact_over_created_at() {
        let now = Utc::now();
        let rule =
            FollowUpRule::new("inact", "Inactivity", TriggerType::Inactivity).after_inactivity_days(3);

        let mut lead = lead_at(LeadStage::Contacted, Duration::days(30), now);
        lead.last_contact = Some(now - Duration::days(1));
        assert!(!rule_matches(&rule, &lead, now).unwrap());
    }

    #[test]
    fn test_stage_change_is_level_triggered() {
        let now = Utc::now();
        let rule = FollowUpRule::new("welcome", "Welcome", TriggerType::StageChange)
            .when_stage(LeadStage::Lead);

        let lead = lead_at(LeadStage::Lead, Duration::hours(5), now);
        assert!(rule_matches(&rule, &lead, now).unwrap());
        assert!(rule_matches(&rule, &lead, now + Duration::hours(1)).unwrap());

        let lead = lead_at(LeadStage::Contacted, Duration::hours(5), now);
        assert!(!rule_matches(&rule, &lead, now).unwrap());
    }

    #[test]
    fn test_property_match_is_plain_equality() {
        let now = Utc::now();
        let rule = FollowUpRule::new("apt", "Apartment", TriggerType::PropertyMatch)
            .for_property_type(PropertyType::Apartment);

        let mut lead = lead_at(LeadStage::Lead, Duration::hours(1), now);
        assert!(!rule_matches(&rule, &lead, now).unwrap());

        lead.property = Some(PropertySnapshot {
            id: "p1".to_string(),
            title: "Apt".to_string(),
            location: "Center".to_string(),
            price: Decimal::new(100_000, 0),
            property_type: PropertyType::Apartment,
            bedrooms: 2,
            bathrooms: 1,
        });
        assert!(rule_matches(&rule, &lead, now).unwrap());
    }

    #[test]
    fn test_missing_condition_fails_loudly() {
        let now = Utc::now();
        // Bypass the catalog so the evaluator sees a malformed rule.
        let rule = FollowUpRule::new("broken", "Broken", TriggerType::TimeBased);
        let lead = lead_at(LeadStage::Lead, Duration::days(1), now);

        assert!(matches!(
            rule_matches(&rule, &lead, now),
            Err(AutomationError::Evaluation(_))
        ));
    }
}
