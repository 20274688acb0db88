use serde::{Deserialize, Serialize};

use super::{
    category_enum, deserialize_id, deserialize_opt_id, Assignable, HasStatus, Record, RecordKind,
};
use crate::validation::{Validate, ValidationErrors};

category_enum! {
    /// Pipeline stage of an inbound lead
    pub enum LeadStatus {
        New => "new",
        Assigned => "assigned",
        Contacted => "contacted",
        Interested => "interested",
        NotInterested => "not_interested",
        Converted => "converted",
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Channel the lead came from ("website", "walk_in", "referral", ...)
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default, alias = "agentId", deserialize_with = "deserialize_opt_id")]
    pub agent_id: Option<String>,
    #[serde(default, alias = "propertyInterest", skip_serializing_if = "Option::is_none")]
    pub property_interest: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Lead {
    /// Form submission; the id is allocated when the lead enters a store.
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            source: source.into(),
            status: LeadStatus::New,
            agent_id: None,
            property_interest: None,
            created_at: None,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.agent_id.is_none()
    }
}

impl Record for Lead {
    const KIND: RecordKind = RecordKind::Lead;

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
            "source" => Some(self.source.as_str()).filter(|s| !s.is_empty()),
            "agent" => self.agent_id.as_deref(),
            "property" => self.property_interest.as_deref(),
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

impl Assignable for Lead {
    /// Handing a fresh lead to an agent also moves it out of `new`.
    fn assign_to(&mut self, agent_id: &str) {
        self.agent_id = Some(agent_id.to_string());
        if self.status == LeadStatus::New {
            self.status = LeadStatus::Assigned;
        }
    }
}

impl HasStatus for Lead {
    type Status = LeadStatus;

    fn status(&self) -> LeadStatus {
        self.status
    }

    fn set_status(&mut self, status: LeadStatus) {
        self.status = status;
    }
}

impl Validate for Lead {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.phone("phone", &self.phone);
        errors.email("email", self.email.as_deref());
        errors.into_result()
    }
}
