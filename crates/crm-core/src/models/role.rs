use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role; decides which screens render and which bulk actions are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "agent", alias = "sales agent", alias = "salesagent")]
    SalesAgent,
    Supervisor,
    Manager,
    Admin,
}

/// Top-level dashboard screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Dashboard,
    Leads,
    Prospects,
    Visits,
    Sales,
    Users,
}

impl Screen {
    /// Action text used when a role is refused this screen
    pub fn view_label(&self) -> &'static str {
        match self {
            Screen::Dashboard => "view dashboard",
            Screen::Leads => "view leads",
            Screen::Prospects => "view prospects",
            Screen::Visits => "view visits",
            Screen::Sales => "view sales",
            Screen::Users => "view users",
        }
    }
}

/// Bulk and form actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateRecord,
    EditRecord,
    AssignRecords,
    ChangeStatus,
    DeleteRecords,
    ManageUsers,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::CreateRecord => "create records",
            Action::EditRecord => "edit records",
            Action::AssignRecords => "assign records",
            Action::ChangeStatus => "change status",
            Action::DeleteRecords => "delete records",
            Action::ManageUsers => "manage users",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SalesAgent => "sales_agent",
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::SalesAgent => "Sales Agent",
            Role::Supervisor => "Supervisor",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }

    /// Screens shown in this role's navigation
    pub fn screens(&self) -> &'static [Screen] {
        match self {
            Role::SalesAgent => &[
                Screen::Dashboard,
                Screen::Leads,
                Screen::Prospects,
                Screen::Visits,
                Screen::Sales,
            ],
            Role::Supervisor | Role::Manager => &[
                Screen::Dashboard,
                Screen::Leads,
                Screen::Prospects,
                Screen::Visits,
                Screen::Sales,
                Screen::Users,
            ],
            Role::Admin => &[Screen::Dashboard, Screen::Users],
        }
    }

    pub fn can_view(&self, screen: Screen) -> bool {
        self.screens().contains(&screen)
    }

    pub fn can(&self, action: Action) -> bool {
        match action {
            Action::CreateRecord | Action::EditRecord | Action::ChangeStatus => {
                !matches!(self, Role::Admin)
            }
            Action::AssignRecords => matches!(self, Role::Supervisor | Role::Manager),
            Action::DeleteRecords => matches!(self, Role::Manager | Role::Admin),
            Action::ManageUsers => matches!(self, Role::Admin),
        }
    }

    /// Whether record lists are narrowed to the user's own / team's records
    pub fn is_scoped(&self) -> bool {
        matches!(self, Role::SalesAgent | Role::Supervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "sales_agent" | "agent" | "salesagent" => Ok(Role::SalesAgent),
            "supervisor" => Ok(Role::Supervisor),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {:?}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_common_spellings() {
        assert_eq!("Sales Agent".parse::<Role>(), Ok(Role::SalesAgent));
        assert_eq!("sales-agent".parse::<Role>(), Ok(Role::SalesAgent));
        assert_eq!("agent".parse::<Role>(), Ok(Role::SalesAgent));
        assert_eq!("MANAGER".parse::<Role>(), Ok(Role::Manager));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_deserializes_aliases() {
        let role: Role = serde_json::from_str(r#""agent""#).unwrap();
        assert_eq!(role, Role::SalesAgent);
        let role: Role = serde_json::from_str(r#""supervisor""#).unwrap();
        assert_eq!(role, Role::Supervisor);
    }

    #[test]
    fn test_agents_cannot_assign_or_delete() {
        assert!(Role::SalesAgent.can(Action::CreateRecord));
        assert!(!Role::SalesAgent.can(Action::AssignRecords));
        assert!(!Role::SalesAgent.can(Action::DeleteRecords));
        assert!(!Role::SalesAgent.can_view(Screen::Users));
    }

    #[test]
    fn test_admin_manages_users_only() {
        assert!(Role::Admin.can(Action::ManageUsers));
        assert!(Role::Admin.can(Action::DeleteRecords));
        assert!(!Role::Admin.can(Action::AssignRecords));
        assert!(!Role::Admin.can_view(Screen::Leads));
        assert!(Role::Admin.can_view(Screen::Users));
    }

    #[test]
    fn test_scoping() {
        assert!(Role::SalesAgent.is_scoped());
        assert!(Role::Supervisor.is_scoped());
        assert!(!Role::Manager.is_scoped());
        assert!(!Role::Admin.is_scoped());
    }
}
