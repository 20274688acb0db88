use std::path::PathBuf;

use crate::models::Role;
use crate::validation::ValidationErrors;

/// Errors that can occur during CRM operations.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Permission denied: {role} cannot {action}")]
    Forbidden { role: Role, action: &'static str },

    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Server returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl CrmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrmError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        CrmError::NotFound { id: id.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
