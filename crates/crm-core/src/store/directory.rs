use std::collections::{BTreeSet, HashMap};

use crate::models::{Role, User};
use crate::session::Session;

/// User index for resolving `agent_id` references and team membership.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<User>,
    by_id: HashMap<String, usize>,
}

impl Directory {
    pub fn new(users: &[User]) -> Self {
        let users = users.to_vec();
        let by_id = users
            .iter()
            .enumerate()
            .map(|(idx, u)| (u.id.clone(), idx))
            .collect();
        Self { users, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.by_id.get(id).map(|&idx| &self.users[idx])
    }

    /// Display name for an agent id, falling back to the raw id
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |u| u.name.as_str())
    }

    /// Agents reporting to `supervisor_id`
    pub fn team_of(&self, supervisor_id: &str) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| u.supervisor_id.as_deref() == Some(supervisor_id))
            .collect()
    }

    /// Active sales agents sorted by name (the "assign to" picker)
    pub fn active_agents(&self) -> Vec<&User> {
        let mut agents: Vec<&User> = self
            .users
            .iter()
            .filter(|u| u.active && u.role == Role::SalesAgent)
            .collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        agents
    }

    /// User ids whose records this session may see. `None` means unrestricted.
    pub fn visible_assignees(&self, session: &Session) -> Option<BTreeSet<String>> {
        if !session.role.is_scoped() {
            return None;
        }
        let mut ids = BTreeSet::from([session.user_id.clone()]);
        if session.role == Role::Supervisor {
            ids.extend(self.team_of(&session.user_id).into_iter().map(|u| u.id.clone()));
        }
        Some(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str, role: Role, supervisor: Option<&str>, active: bool) -> User {
        let mut user = User::new(name, format!("{}@example.com", id), role);
        user.id = id.to_string();
        user.supervisor_id = supervisor.map(str::to_string);
        user.active = active;
        user
    }

    fn directory() -> Directory {
        Directory::new(&[
            user("1", "Sunita", Role::Supervisor, None, true),
            user("2", "Vikram", Role::SalesAgent, Some("1"), true),
            user("3", "Anil", Role::SalesAgent, Some("1"), true),
            user("4", "Zoya", Role::SalesAgent, None, false),
            user("5", "Manoj", Role::Manager, None, true),
        ])
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let dir = directory();
        assert_eq!(dir.display_name("2"), "Vikram");
        assert_eq!(dir.display_name("99"), "99");
    }

    #[test]
    fn test_active_agents_sorted() {
        let dir = directory();
        let names: Vec<&str> = dir.active_agents().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Anil", "Vikram"]);
    }

    #[test]
    fn test_visible_assignees_by_role() {
        let dir = directory();

        let agent = Session::new("2", "Vikram", Role::SalesAgent);
        assert_eq!(dir.visible_assignees(&agent), Some(BTreeSet::from(["2".to_string()])));

        let supervisor = Session::new("1", "Sunita", Role::Supervisor);
        let ids = dir.visible_assignees(&supervisor).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["1", "2", "3"]);

        let manager = Session::new("5", "Manoj", Role::Manager);
        assert!(dir.visible_assignees(&manager).is_none());

        let admin = Session::new("6", "Ravi", Role::Admin);
        assert!(!admin.role.is_scoped());
        assert!(dir.visible_assignees(&admin).is_none());
    }
}
