//! Synchronous per-field checks run before a record is admitted to a store.

use std::fmt;

use crate::search::digits_only;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors for one submission, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Field must be non-blank
    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    pub fn require_some<T>(&mut self, field: &'static str, value: &Option<T>) {
        if value.is_none() {
            self.push(field, "is required");
        }
    }

    /// Required phone with 7 to 15 digits once punctuation is stripped
    pub fn phone(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
            return;
        }
        let digits = digits_only(value).len();
        if !(7..=15).contains(&digits) {
            self.push(field, "must contain 7 to 15 digits");
        }
    }

    /// Optional email; checked only when present
    pub fn email(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(email) = value.map(str::trim).filter(|e| !e.is_empty()) {
            let valid = email
                .split_once('@')
                .map(|(user, domain)| !user.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                self.push(field, "is not a valid email address");
            }
        }
    }

    pub fn non_negative(&mut self, field: &'static str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.push(field, "must be a non-negative amount");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_flags_blank_values() {
        let mut errors = ValidationErrors::new();
        errors.require("name", "   ");
        errors.require("city", "Pune");
        assert!(errors.has_error("name"));
        assert!(!errors.has_error("city"));
        assert_eq!(errors.to_string(), "name is required");
    }

    #[test]
    fn test_phone_digit_count() {
        let mut errors = ValidationErrors::new();
        errors.phone("phone", "+91 98765-43210");
        assert!(errors.is_empty());

        errors.phone("phone", "12-34");
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].message, "must contain 7 to 15 digits");
    }

    #[test]
    fn test_email_is_optional_but_checked() {
        let mut errors = ValidationErrors::new();
        errors.email("email", None);
        errors.email("email", Some(""));
        errors.email("email", Some("asha@example.com"));
        assert!(errors.is_empty());

        errors.email("email", Some("asha.example.com"));
        errors.email("email", Some("@example.com"));
        assert_eq!(errors.errors().len(), 2);
    }

    #[test]
    fn test_into_result_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.require("name", "");
        errors.non_negative("amount", -5.0);
        let err = errors.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "name is required; amount must be a non-negative amount"
        );
    }
}
