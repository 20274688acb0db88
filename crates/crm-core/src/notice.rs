//! Banner messages shown after a form submission or bulk action.

use serde::Serialize;

use crate::error::CrmError;

/// Longest server body echoed into a banner
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn from_error(err: &CrmError) -> Self {
        let message = match err {
            CrmError::NotLoggedIn => "Please sign in to continue.".to_string(),
            CrmError::Validation(errors) => format!("Please fix the form: {}", errors),
            CrmError::Http { status, body } => match server_message(body) {
                Some(msg) => format!("Server error ({}): {}", status, msg),
                None => format!("Server error ({})", status),
            },
            CrmError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        };
        Self::error(message)
    }

    /// Success banner for `Ok`, error banner for `Err`
    pub fn from_result<T>(result: &Result<T, CrmError>, success: impl Into<String>) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(err) => Self::from_error(err),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Pull `message` / `error` out of a JSON error body, else use the trimmed text.
fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(text) = json.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }
    Some(body.chars().take(MAX_BODY_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrors;

    #[test]
    fn test_http_error_uses_json_message() {
        let err = CrmError::Http {
            status: 409,
            body: r#"{"message": "Phone already registered"}"#.to_string(),
        };
        let notice = Notice::from_error(&err);
        assert!(notice.is_error());
        assert_eq!(notice.message, "Server error (409): Phone already registered");
    }

    #[test]
    fn test_http_error_plain_and_empty_body() {
        let err = CrmError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(Notice::from_error(&err).message, "Server error (500): boom");

        let err = CrmError::Http {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(Notice::from_error(&err).message, "Server error (502)");
    }

    #[test]
    fn test_long_body_is_truncated() {
        let err = CrmError::Http {
            status: 500,
            body: "x".repeat(1000),
        };
        let notice = Notice::from_error(&err);
        assert_eq!(notice.message.len(), "Server error (500): ".len() + MAX_BODY_CHARS);
    }

    #[test]
    fn test_validation_banner() {
        let mut errors = ValidationErrors::new();
        errors.require("name", "");
        let notice = Notice::from_error(&CrmError::Validation(errors));
        assert_eq!(notice.message, "Please fix the form: name is required");
    }

    #[test]
    fn test_from_result() {
        let ok: Result<(), CrmError> = Ok(());
        assert_eq!(Notice::from_result(&ok, "Saved"), Notice::success("Saved"));

        let err: Result<(), CrmError> = Err(CrmError::NotLoggedIn);
        assert_eq!(Notice::from_result(&err, "Saved").message, "Please sign in to continue.");
    }
}
