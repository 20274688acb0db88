//! Signed-in identity, passed explicitly to everything that needs it.
//!
//! A [`SessionContext`] is created once per app and cloned into the screens
//! and the API client. `login` sets it, `logout` clears it; nothing reads
//! identity from anywhere else.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CrmError, Result};
use crate::models::{Action, Role, Screen, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    /// Bearer token for API calls, when the backend issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
            token: None,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id.clone(), user.name.clone(), user.role)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `Forbidden` unless this session's role may perform `action`
    pub fn authorize(&self, action: Action) -> Result<()> {
        if self.role.can(action) {
            Ok(())
        } else {
            Err(CrmError::Forbidden {
                role: self.role,
                action: action.label(),
            })
        }
    }

    /// `Forbidden` unless this session's role has `screen` in its navigation
    pub fn authorize_view(&self, screen: Screen) -> Result<()> {
        if self.role.can_view(screen) {
            Ok(())
        } else {
            Err(CrmError::Forbidden {
                role: self.role,
                action: screen.view_label(),
            })
        }
    }
}

/// Shared handle to the current session (or none).
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let ctx = Self::new();
        ctx.login(session);
        ctx
    }

    pub fn login(&self, session: Session) {
        info!(user_id = %session.user_id, role = %session.role, "session started");
        *self.inner.write() = Some(session);
    }

    /// Clear the session, returning the one that was active
    pub fn logout(&self) -> Option<Session> {
        let previous = self.inner.write().take();
        if let Some(session) = &previous {
            info!(user_id = %session.user_id, "session ended");
        }
        previous
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(CrmError::NotLoggedIn)
    }

    /// Current session, provided its role may perform `action`
    pub fn require_action(&self, action: Action) -> Result<Session> {
        let session = self.require()?;
        session.authorize(action)?;
        Ok(session)
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().and_then(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout_lifecycle() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_logged_in());
        assert!(matches!(ctx.require(), Err(CrmError::NotLoggedIn)));

        ctx.login(Session::new("7", "Vikram", Role::SalesAgent));
        assert_eq!(ctx.require().unwrap().user_id, "7");

        let ended = ctx.logout().unwrap();
        assert_eq!(ended.name, "Vikram");
        assert!(ctx.current().is_none());
        assert!(ctx.logout().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = SessionContext::new();
        let screen = ctx.clone();
        ctx.login(Session::new("1", "Admin", Role::Admin).with_token("abc"));
        assert_eq!(screen.token().as_deref(), Some("abc"));
        ctx.logout();
        assert!(screen.token().is_none());
    }

    #[test]
    fn test_require_action_checks_role() {
        let ctx = SessionContext::with_session(Session::new("7", "Vikram", Role::SalesAgent));
        let err = ctx.require_action(Action::DeleteRecords).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: Sales Agent cannot delete records");
        assert!(ctx.require_action(Action::CreateRecord).is_ok());
    }

    #[test]
    fn test_authorize_view_follows_navigation() {
        let agent = Session::new("7", "Vikram", Role::SalesAgent);
        let err = agent.authorize_view(Screen::Users).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: Sales Agent cannot view users");
        assert!(agent.authorize_view(Screen::Leads).is_ok());

        let admin = Session::new("1", "Ravi", Role::Admin);
        assert!(matches!(
            admin.authorize_view(Screen::Leads),
            Err(CrmError::Forbidden { role: Role::Admin, .. })
        ));
        assert!(admin.authorize_view(Screen::Dashboard).is_ok());
    }

    #[test]
    fn test_session_json_is_camel_case() {
        let json = r#"{"userId": "3", "name": "Sunita", "role": "supervisor"}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.role, Role::Supervisor);
        assert!(session.token.is_none());
    }
}
