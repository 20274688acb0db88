use serde::{Deserialize, Serialize};

use super::{
    category_enum, deserialize_id, deserialize_opt_id, Assignable, HasStatus, Record, RecordKind,
};
use crate::validation::{Validate, ValidationErrors};

category_enum! {
    /// Buying temperature of a qualified prospect
    pub enum ProspectStatus {
        Hot => "hot",
        Warm => "warm",
        Cold => "cold",
    }
}

impl Default for ProspectStatus {
    fn default() -> Self {
        ProspectStatus::Warm
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, alias = "preferredLocation")]
    pub preferred_location: String,
    /// "apartment", "villa", "plot", ...
    #[serde(default, alias = "propertyType")]
    pub property_type: String,
    #[serde(default)]
    pub status: ProspectStatus,
    #[serde(default, alias = "agentId", deserialize_with = "deserialize_opt_id")]
    pub agent_id: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Prospect {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            budget: None,
            preferred_location: String::new(),
            property_type: String::new(),
            status: ProspectStatus::default(),
            agent_id: None,
            created_at: None,
        }
    }
}

impl Record for Prospect {
    const KIND: RecordKind = RecordKind::Prospect;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.phone.as_str()];
        if let Some(email) = &self.email {
            fields.push(email);
        }
        fields
    }

    fn category(&self, key: &str) -> Option<&str> {
        match key {
            "status" => Some(self.status.as_str()),
            "location" => Some(self.preferred_location.as_str()).filter(|s| !s.is_empty()),
            "property_type" => Some(self.property_type.as_str()).filter(|s| !s.is_empty()),
            "agent" => self.agent_id.as_deref(),
            _ => None,
        }
    }

    fn timestamp(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn phone(&self) -> Option<&str> {
        Some(&self.phone)
    }

    fn assignee(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }
}

impl Assignable for Prospect {
    fn assign_to(&mut self, agent_id: &str) {
        self.agent_id = Some(agent_id.to_string());
    }
}

impl HasStatus for Prospect {
    type Status = ProspectStatus;

    fn status(&self) -> ProspectStatus {
        self.status
    }

    fn set_status(&mut self, status: ProspectStatus) {
        self.status = status;
    }
}

impl Validate for Prospect {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.phone("phone", &self.phone);
        errors.email("email", self.email.as_deref());
        if let Some(budget) = self.budget {
            errors.non_negative("budget", budget);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_aliases() {
        let json = r#"{
            "id": "p-1",
            "name": "Meera",
            "phone": "9123456780",
            "budget": 7500000,
            "preferredLocation": "Baner",
            "propertyType": "apartment",
            "status": "hot"
        }"#;
        let prospect: Prospect = serde_json::from_str(json).unwrap();
        assert_eq!(prospect.preferred_location, "Baner");
        assert_eq!(prospect.category("property_type"), Some("apartment"));
        assert_eq!(prospect.status, ProspectStatus::Hot);
        assert_eq!(prospect.budget, Some(7_500_000.0));
    }

    #[test]
    fn test_negative_budget_is_rejected() {
        let mut prospect = Prospect::new("Meera", "9123456780");
        prospect.budget = Some(-1.0);
        assert!(prospect.validate().unwrap_err().has_error("budget"));
    }
}
