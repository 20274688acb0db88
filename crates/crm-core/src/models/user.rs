use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_opt_id, Record, RecordKind, Role};
use crate::validation::{Validate, ValidationErrors};

fn default_active() -> bool {
    true
}

/// Staff account. `id` is what `agent_id` on other records refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, alias = "userId", deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    /// Supervisor this agent reports to
    #[serde(default, alias = "supervisorId", deserialize_with = "deserialize_opt_id")]
    pub supervisor_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            role,
            supervisor_id: None,
            active: true,
            created_at: None,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::SalesAgent
    }
}

impl Record for User {
    const KIND: RecordKind = RecordKind::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.phone.as_str()]
    }

    fn category(&self, key: &str) -> Option<&str> {
        match key {
            "role" => Some(self.role.as_str()),
            "active" => Some(if self.active { "true" } else { "false" }),
            "supervisor" => self.supervisor_id.as_deref(),
            _ => None,
        }
    }

    fn timestamp(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn phone(&self) -> Option<&str> {
        Some(self.phone.as_str()).filter(|p| !p.is_empty())
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require("email", &self.email);
        errors.email("email", Some(&self.email));
        if !self.phone.trim().is_empty() {
            errors.phone("phone", &self.phone);
        }
        errors.into_result()
    }
}
