// Lead records and the lifecycle state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AutomationError;

/// Lifecycle stage of a lead.
///
/// Transitions move forward through the pipeline; `lost` is terminal except
/// for reactivation back to `lead`, and `closed` is fully terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "lead_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    Lead,
    Contacted,
    Qualified,
    Negotiating,
    Closed,
    Lost,
}

impl LeadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStage::Lead => "lead",
            LeadStage::Contacted => "contacted",
            LeadStage::Qualified => "qualified",
            LeadStage::Negotiating => "negotiating",
            LeadStage::Closed => "closed",
            LeadStage::Lost => "lost",
        }
    }

    /// Validated transition table. Forward pipeline moves plus marking a
    /// non-terminal lead as lost; reactivation is the only way out of `lost`.
    pub fn can_transition(&self, to: LeadStage) -> bool {
        use LeadStage::*;
        match (self, to) {
            (Lead, Contacted) => true,
            (Contacted, Qualified) => true,
            (Qualified, Negotiating) => true,
            (Negotiating, Closed) => true,
            (Lost, Lead) => true,
            (Lead | Contacted | Qualified | Negotiating, Lost) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStage {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(LeadStage::Lead),
            "contacted" => Ok(LeadStage::Contacted),
            "qualified" => Ok(LeadStage::Qualified),
            "negotiating" => Ok(LeadStage::Negotiating),
            "closed" => Ok(LeadStage::Closed),
            "lost" => Ok(LeadStage::Lost),
            other => Err(AutomationError::InvalidStage(other.to_string())),
        }
    }
}

/// Category of a marketplace listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Commercial,
    Land,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Commercial => "commercial",
            PropertyType::Land => "land",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details of the agent a lead is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Snapshot of the listing a lead inquired about, denormalized onto the
/// lead at fetch time so template rendering needs no further lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: String,
    pub title: String,
    pub location: String,
    pub price: Decimal,
    pub property_type: PropertyType,
    pub bedrooms: i32,
    pub bathrooms: i32,
}

/// A customer inquiry as seen by the automation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub agent: AgentContact,
    pub stage: LeadStage,
    pub created_at: DateTime<Utc>,
    pub last_contact: Option<DateTime<Utc>>,
    pub property: Option<PropertySnapshot>,
}

impl Lead {
    /// Last contact timestamp, defaulting to creation time when no contact
    /// has been recorded yet.
    pub fn last_contact_or_created(&self) -> DateTime<Utc> {
        self.last_contact.unwrap_or(self.created_at)
    }

    pub fn property_type(&self) -> Option<PropertyType> {
        self.property.as_ref().map(|p| p.property_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(LeadStage::Lead.can_transition(LeadStage::Contacted));
        assert!(LeadStage::Contacted.can_transition(LeadStage::Qualified));
        assert!(LeadStage::Qualified.can_transition(LeadStage::Negotiating));
        assert!(LeadStage::Negotiating.can_transition(LeadStage::Closed));
    }

    #[test]
    fn test_lost_is_reenterable_only_as_lead() {
        assert!(LeadStage::Lost.can_transition(LeadStage::Lead));
        assert!(!LeadStage::Lost.can_transition(LeadStage::Contacted));
        assert!(!LeadStage::Lost.can_transition(LeadStage::Closed));
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(!LeadStage::Closed.can_transition(LeadStage::Lead));
        assert!(!LeadStage::Closed.can_transition(LeadStage::Lost));
    }

    #[test]
    fn test_no_stage_skipping() {
        assert!(!LeadStage::Lead.can_transition(LeadStage::Qualified));
        assert!(!LeadStage::Contacted.can_transition(LeadStage::Closed));
    }

    #[test]
    fn test_stage_parsing_rejects_unknown_names() {
        assert_eq!("negotiating".parse::<LeadStage>().unwrap(), LeadStage::Negotiating);
        assert!("pending".parse::<LeadStage>().is_err());
    }

    #[test]
    fn test_last_contact_defaults_to_created_at() {
        let created = Utc::now();
        let lead = Lead {
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
            stage: LeadStage::Lead,
            created_at: created,
            last_contact: None,
            property: None,
        };

        assert_eq!(lead.last_contact_or_created(), created);
    }
}
