use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crm_core::{CoreConfig, Session};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "realty-crm";
const CONFIG_FILE: &str = "config.json";

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    #[serde(flatten)]
    pub core: CoreConfig,

    /// Signed-in identity to act as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl CliConfig {
    /// `<config dir>/realty-crm/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: CliConfig = serde_json::from_str(json).context("Failed to deserialize config")?;
        config.core.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; the default path is optional.
    /// Environment overrides apply last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };
        Ok(Self {
            core: config
                .core
                .apply_env()
                .context("Invalid CRM_API_URL / CRM_DATA_FILE override")?,
            session: config.session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::Role;
    use std::io::Write;

    #[test]
    fn test_parse_config_minimal() {
        let config = CliConfig::from_json("{}").unwrap();
        assert_eq!(config.core, CoreConfig::default());
        assert!(config.session.is_none());
    }

    #[test]
    fn test_parse_config_with_session() {
        let json = r#"{
            "apiBaseUrl": "https://crm.example.com",
            "dataFile": "/tmp/crm.json",
            "poll": {"intervalSecs": 10},
            "session": {"userId": "7", "name": "Vikram", "role": "sales_agent", "token": "abc"}
        }"#;
        let config = CliConfig::from_json(json).unwrap();
        assert_eq!(config.core.api_base_url, "https://crm.example.com");
        assert_eq!(config.core.data_file, PathBuf::from("/tmp/crm.json"));
        assert_eq!(config.core.poll.interval_secs, 10);

        let session = config.session.unwrap();
        assert_eq!(session.user_id, "7");
        assert_eq!(session.role, Role::SalesAgent);
        assert_eq!(session.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_config_rejects_bad_url() {
        assert!(CliConfig::from_json(r#"{"apiBaseUrl": "ftp://nope"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"requestTimeoutSecs": 3}}"#).unwrap();

        let config = CliConfig::load(file.path()).unwrap();
        assert_eq!(config.core.request_timeout_secs, 3);
    }

    #[test]
    fn test_resolve_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::resolve(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
