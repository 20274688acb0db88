use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CrmError, Result};
use crate::models::{Lead, Prospect, Sale, User, Visit};

/// The static JSON payload the dashboard boots from.
///
/// Every array is optional; a missing array loads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub prospects: Vec<Prospect>,
    pub leads: Vec<Lead>,
    pub visits: Vec<Visit>,
    pub sales: Vec<Sale>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CrmError::io(path, e))?;
        let fixture = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            users = fixture.users.len(),
            prospects = fixture.prospects.len(),
            leads = fixture.leads.len(),
            visits = fixture.visits.len(),
            sales = fixture.sales.len(),
            "loaded fixture"
        );
        Ok(fixture)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the payload back as pretty JSON. Written to a sibling temp file
    /// first so a failed write leaves the old file intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| CrmError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| CrmError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "users": [
            {"userId": 1, "name": "Sunita", "email": "sunita@example.com", "role": "supervisor"},
            {"userId": 2, "name": "Vikram", "email": "vikram@example.com", "role": "agent", "supervisorId": 1}
        ],
        "leads": [
            {"id": 1, "name": "Asha", "phone": "9876500001", "source": "website", "status": "new"}
        ]
    }"#;

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let fixture = Fixture::from_json(PAYLOAD).unwrap();
        assert_eq!(fixture.users.len(), 2);
        assert_eq!(fixture.leads.len(), 1);
        assert!(fixture.prospects.is_empty());
        assert!(fixture.visits.is_empty());
        assert!(fixture.sales.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_parse_error() {
        let err = Fixture::from_json(r#"{"leads": [{"id": 1}]}"#).unwrap_err();
        assert!(matches!(err, CrmError::Parse(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.json");

        let fixture = Fixture::from_json(PAYLOAD).unwrap();
        fixture.save(&path).unwrap();

        let loaded = Fixture::load(&path).unwrap();
        assert_eq!(loaded, fixture);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Fixture::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CrmError::Io { .. }));
    }
}
