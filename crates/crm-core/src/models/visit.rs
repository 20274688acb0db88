use serde::{Deserialize, Serialize};

use super::{
    category_enum, deserialize_id, deserialize_opt_id, Assignable, HasStatus, Record, RecordKind,
};
use crate::validation::{Validate, ValidationErrors};

category_enum! {
    pub enum VisitKind {
        Site => "site",
        Office => "office",
    }
}

category_enum! {
    pub enum VisitStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for VisitStatus {
    fn default() -> Self {
        VisitStatus::Scheduled
    }
}

/// A site or office visit booked with a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "clientName")]
    pub client_name: String,
    pub phone: String,
    #[serde(alias = "visitType", alias = "type")]
    pub kind: VisitKind,
    #[serde(default)]
    pub property: String,
    #[serde(default, alias = "agentId", deserialize_with = "deserialize_opt_id")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(
        default,
        alias = "scheduledAt",
        alias = "date",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Visit {
    pub fn new(
        client_name: impl Into<String>,
        phone: impl Into<String>,
        kind: VisitKind,
        scheduled_at: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            client_name: client_name.into(),
            phone: phone.into(),
            kind,
            property: String::new(),
            agent_id: None,
            status: VisitStatus::Scheduled,
            scheduled_at: Some(scheduled_at.into()),
            notes: None,
        }
    }
}

impl Record for Visit {
    const KIND: RecordKind = RecordKind::Visit;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.client_name.as_str(),
            self.phone.as_str(),
            self.property.as_str(),
        ]
    }

    fn category(&self, key: &str) -> Option<&str> {
        match key {
            "status" => Some(self.status.as_str()),
            "kind" => Some(self.kind.as_str()),
            "agent" => self.agent_id.as_deref(),
            _ => None,
        }
    }

    fn timestamp(&self) -> Option<&str> {
        self.scheduled_at.as_deref()
    }

    fn phone(&self) -> Option<&str> {
        Some(&self.phone)
    }

    fn assignee(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }
}

impl Assignable for Visit {
    fn assign_to(&mut self, agent_id: &str) {
        self.agent_id = Some(agent_id.to_string());
    }
}

impl HasStatus for Visit {
    type Status = VisitStatus;

    fn status(&self) -> VisitStatus {
        self.status
    }

    fn set_status(&mut self, status: VisitStatus) {
        self.status = status;
    }
}

impl Validate for Visit {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("client_name", &self.client_name);
        errors.phone("phone", &self.phone);
        match self.scheduled_at.as_deref() {
            None => errors.push("scheduled_at", "is required"),
            Some(raw) if super::parse_timestamp(raw).is_none() => {
                errors.push("scheduled_at", "is not a valid date")
            }
            Some(_) => {}
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_type_alias() {
        let json = r#"{
            "id": 4,
            "clientName": "Kiran",
            "phone": "9000000001",
            "type": "office",
            "date": "2024-05-10 11:00:00"
        }"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert_eq!(visit.kind, VisitKind::Office);
        assert_eq!(visit.status, VisitStatus::Scheduled);
        assert_eq!(visit.category("kind"), Some("office"));
    }

    #[test]
    fn test_visit_requires_parseable_schedule() {
        let visit = Visit::new("Kiran", "9000000001", VisitKind::Site, "next tuesday");
        assert!(visit.validate().unwrap_err().has_error("scheduled_at"));

        let visit = Visit::new("Kiran", "9000000001", VisitKind::Site, "2024-05-10");
        assert!(visit.validate().is_ok());
    }
}
