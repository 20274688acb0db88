use serde::{Deserialize, Serialize};

use super::{
    category_enum, deserialize_id, deserialize_opt_id, Assignable, HasStatus, Record, RecordKind,
};
use crate::validation::{Validate, ValidationErrors};

category_enum! {
    pub enum SaleStatus {
        Pending => "pending",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "clientName")]
    pub client_name: String,
    pub phone: String,
    pub property: String,
    pub amount: f64,
    #[serde(default, alias = "agentId", deserialize_with = "deserialize_opt_id")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default, alias = "soldAt", alias = "date", skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<String>,
}

impl Sale {
    pub fn is_closed(&self) -> bool {
        self.status == SaleStatus::Closed
    }
}

impl Record for Sale {
    const KIND: RecordKind = RecordKind::Sale;

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
            "agent" => self.agent_id.as_deref(),
            _ => None,
        }
    }

    fn timestamp(&self) -> Option<&str> {
        self.sold_at.as_deref()
    }

    fn phone(&self) -> Option<&str> {
        Some(&self.phone)
    }

    fn assignee(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }
}

impl Assignable for Sale {
    fn assign_to(&mut self, agent_id: &str) {
        self.agent_id = Some(agent_id.to_string());
    }
}

impl HasStatus for Sale {
    type Status = SaleStatus;

    fn status(&self) -> SaleStatus {
        self.status
    }

    fn set_status(&mut self, status: SaleStatus) {
        self.status = status;
    }
}

impl Validate for Sale {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("client_name", &self.client_name);
        errors.phone("phone", &self.phone);
        errors.require("property", &self.property);
        errors.non_negative("amount", self.amount);
        errors.into_result()
    }
}
