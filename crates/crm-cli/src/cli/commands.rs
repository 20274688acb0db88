use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use crm_core::api::ApiClient;
use crm_core::models::{Assignable, HasStatus, Role, Screen};
use crm_core::poller::watch_new_leads;
use crm_core::{
    CoreConfig, CrmData, DashboardSummary, Directory, FilterState, Predicate, Prospect, Record,
    RecordList, RecordStore, Session, SessionContext,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// Which record list a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Leads,
    Prospects,
    Visits,
    Sales,
    Users,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Leads => "leads",
            Kind::Prospects => "prospects",
            Kind::Visits => "visits",
            Kind::Sales => "sales",
            Kind::Users => "users",
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            Kind::Leads => Screen::Leads,
            Kind::Prospects => Screen::Prospects,
            Kind::Visits => Screen::Visits,
            Kind::Sales => Screen::Sales,
            Kind::Users => Screen::Users,
        }
    }
}

/// Run `$body` with `$store` bound to the mutable store for `$kind`.
/// `$users` handles the user list separately (no assignee or status).
macro_rules! with_store {
    ($kind:expr, $data:expr, |$store:ident| $body:expr, users => $users:expr) => {
        match $kind {
            Kind::Leads => {
                let $store = &mut $data.leads;
                $body
            }
            Kind::Prospects => {
                let $store = &mut $data.prospects;
                $body
            }
            Kind::Visits => {
                let $store = &mut $data.visits;
                $body
            }
            Kind::Sales => {
                let $store = &mut $data.sales;
                $body
            }
            Kind::Users => $users,
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ListArgs {
    fn filter_state(&self) -> FilterState {
        let mut filter = FilterState::new().with_date_range(self.from, self.to);
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }
        for (field, value) in &self.filters {
            filter.set_category(field.clone(), value.clone());
        }
        filter
    }
}

/// Parse a `--filter key=value` argument
pub fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

/// Fixture data plus the identity commands run as
pub struct Workspace {
    pub data: CrmData,
    pub session: SessionContext,
    directory: Directory,
}

impl Workspace {
    pub fn new(data: CrmData, session: SessionContext) -> Self {
        let directory = data.directory();
        Self {
            data,
            session,
            directory,
        }
    }

    /// Act as the fixture user with this id
    pub fn login_as(&self, user_id: &str) -> Result<()> {
        let user = self
            .directory
            .get(user_id)
            .ok_or_else(|| anyhow!("No user with id {}", user_id))?;
        if !user.active {
            bail!("User {} is deactivated", user_id);
        }
        self.session.login(Session::for_user(user));
        Ok(())
    }

    /// Role scope of the current session; `None` when signed out or unrestricted
    fn scope(&self) -> Option<Predicate> {
        self.session
            .current()
            .and_then(|session| self.directory.visible_assignees(&session))
            .map(|user_ids| Predicate::AssignedTo { user_ids })
    }

    /// Refuse screens missing from the signed-in role's navigation
    fn authorize_view(&self, screen: Screen) -> Result<()> {
        if let Some(session) = self.session.current() {
            session.authorize_view(screen)?;
        }
        Ok(())
    }

    pub fn list(&self, kind: Kind, args: &ListArgs) -> Result<Value> {
        self.authorize_view(kind.screen())?;
        let ctx = (&self.session, &self.directory);
        match kind {
            Kind::Leads => list_records(&self.data.leads, ctx, args),
            Kind::Prospects => list_records(&self.data.prospects, ctx, args),
            Kind::Visits => list_records(&self.data.visits, ctx, args),
            Kind::Sales => list_records(&self.data.sales, ctx, args),
            Kind::Users => list_records(&self.data.users, ctx, args),
        }
    }

    pub fn assign(&mut self, kind: Kind, agent_id: &str, ids: &[String]) -> Result<Value> {
        match self.directory.get(agent_id) {
            Some(user) if user.is_agent() && user.active => {}
            _ => bail!("No active sales agent with id {}", agent_id),
        }
        let ctx = (&self.session, &self.directory);
        with_store!(
            kind,
            self.data,
            |store| assign_records(store, ctx, agent_id, ids),
            users => bail!("users cannot be assigned")
        )
    }

    pub fn set_status(&mut self, kind: Kind, status: &str, ids: &[String]) -> Result<Value> {
        let ctx = (&self.session, &self.directory);
        with_store!(
            kind,
            self.data,
            |store| set_status_records(store, ctx, status, ids),
            users => bail!("users have no status")
        )
    }

    pub fn delete(&mut self, kind: Kind, ids: &[String]) -> Result<Value> {
        let ctx = (&self.session, &self.directory);
        with_store!(
            kind,
            self.data,
            |store| delete_records(store, ctx, ids),
            users => delete_records(&mut self.data.users, ctx, ids)
        )
    }

    pub fn dedupe(&mut self, kind: Kind) -> Result<Value> {
        let ctx = (&self.session, &self.directory);
        with_store!(
            kind,
            self.data,
            |store| dedupe_records(store, ctx),
            users => dedupe_records(&mut self.data.users, ctx)
        )
    }

    pub fn stats(&self) -> Result<Value> {
        self.authorize_view(Screen::Dashboard)?;
        let summary = DashboardSummary::compute(&self.data, self.scope().as_ref());
        Ok(serde_json::to_value(summary)?)
    }

    /// Add a prospect to the local list. Agents own what they create.
    pub fn create_prospect(&mut self, mut prospect: Prospect) -> Result<Value> {
        if let Some(session) = self.session.current() {
            if session.role == Role::SalesAgent && prospect.agent_id.is_none() {
                prospect.agent_id = Some(session.user_id);
            }
        }
        let ctx = (&self.session, &self.directory);
        let id = with_list(&mut self.data.prospects, ctx, |list| list.add(prospect))?;
        Ok(json!({ "created": self.data.prospects.get(&id) }))
    }

    /// Record a prospect the server created, keeping its id when it has one
    pub fn record_remote_prospect(&mut self, prospect: Prospect) -> Result<Value> {
        let ctx = (&self.session, &self.directory);
        let id = if prospect.id.trim().is_empty() {
            with_list(&mut self.data.prospects, ctx, |list| list.add(prospect))?
        } else {
            let id = prospect.id.clone();
            with_list(&mut self.data.prospects, ctx, |list| list.upsert(prospect))?;
            id
        };
        Ok(json!({ "created": self.data.prospects.get(&id), "remote": true }))
    }

    /// POST the prospect to the backend, then mirror it locally
    pub async fn create_prospect_remote(
        &mut self,
        config: &CoreConfig,
        prospect: Prospect,
    ) -> Result<Value> {
        let api = ApiClient::new(config, self.session.clone())?;
        let created = api
            .create_prospect(&prospect)
            .await
            .context("Failed to create prospect")?;
        self.record_remote_prospect(created)
    }
}

type Ctx<'a> = (&'a SessionContext, &'a Directory);

/// Run `op` against a scoped list over `store`, putting the store back afterwards
fn with_list<R: Record, T>(
    store: &mut RecordStore<R>,
    (session, directory): Ctx<'_>,
    op: impl FnOnce(&mut RecordList<R>) -> crm_core::Result<T>,
) -> crm_core::Result<T> {
    let mut list = RecordList::new(std::mem::take(store), session.clone()).scoped(directory);
    let outcome = op(&mut list);
    *store = list.into_store();
    outcome
}

/// Select `ids`, returning the ones this session cannot see
fn select_ids<R: Record>(list: &mut RecordList<R>, ids: &[String]) -> Vec<String> {
    list.clear_selection();
    let mut skipped = Vec::new();
    for id in ids {
        if list.selection().contains(id) {
            continue;
        }
        if !list.toggle(id) {
            skipped.push(id.clone());
        }
    }
    skipped
}

fn list_records<R: Record + Serialize>(
    store: &RecordStore<R>,
    (session, directory): Ctx<'_>,
    args: &ListArgs,
) -> Result<Value> {
    let mut list = RecordList::new(store.clone(), session.clone()).scoped(directory);
    list.set_filter(args.filter_state());
    let visible = list.visible();
    Ok(json!({
        "kind": R::KIND.label(),
        "total": store.len(),
        "count": visible.len(),
        "records": visible,
    }))
}

fn assign_records<R: Assignable>(
    store: &mut RecordStore<R>,
    ctx: Ctx<'_>,
    agent_id: &str,
    ids: &[String],
) -> Result<Value> {
    let value = with_list(store, ctx, |list| {
        let skipped = select_ids(list, ids);
        let assigned = list.assign_selected(agent_id)?;
        info!(kind = %R::KIND, agent_id, assigned, "assigned records");
        Ok(json!({ "assigned": assigned, "agentId": agent_id, "skipped": skipped }))
    })?;
    Ok(value)
}

fn set_status_records<R>(
    store: &mut RecordStore<R>,
    ctx: Ctx<'_>,
    status: &str,
    ids: &[String],
) -> Result<Value>
where
    R: HasStatus,
    R::Status: FromStr<Err = String>,
{
    let status: R::Status = status.parse().map_err(|e: String| anyhow!(e))?;
    let value = with_list(store, ctx, |list| {
        let skipped = select_ids(list, ids);
        let changed = list.set_status_selected(status)?;
        Ok(json!({ "changed": changed, "status": status.to_string(), "skipped": skipped }))
    })?;
    Ok(value)
}

fn delete_records<R: Record>(
    store: &mut RecordStore<R>,
    ctx: Ctx<'_>,
    ids: &[String],
) -> Result<Value> {
    let value = with_list(store, ctx, |list| {
        let skipped = select_ids(list, ids);
        let removed = list.delete_selected()?;
        let deleted: Vec<&str> = removed.iter().map(|r| r.id()).collect();
        Ok(json!({ "deleted": deleted, "skipped": skipped }))
    })?;
    Ok(value)
}

fn dedupe_records<R: Record>(store: &mut RecordStore<R>, ctx: Ctx<'_>) -> Result<Value> {
    let value = with_list(store, ctx, |list| {
        let removed = list.remove_duplicate_phones()?;
        let ids: Vec<&str> = removed.iter().map(|r| r.id()).collect();
        Ok(json!({ "removed": ids }))
    })?;
    Ok(value)
}

/// Print new-lead counts for `agent_id` (default: the signed-in user) until
/// Ctrl-C or the poller stops.
pub async fn watch_leads(
    config: &CoreConfig,
    session: &SessionContext,
    agent_id: Option<String>,
    mut emit: impl FnMut(&str, u64),
) -> Result<()> {
    let agent_id = match agent_id {
        Some(id) => id,
        None => session.require()?.user_id,
    };
    let api = ApiClient::new(config, session.clone())?;
    let mut subscription = watch_new_leads(api, agent_id.clone(), config.poll);
    info!(%agent_id, interval_secs = config.poll.interval_secs, "watching new leads");

    loop {
        tokio::select! {
            update = subscription.changed() => match update {
                Some(count) => emit(&agent_id, count),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    subscription.cancel().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::{CrmError, Fixture};

    const FIXTURE: &str = r#"{
        "users": [
            {"id": 1, "name": "Ravi", "email": "ravi@example.com", "role": "admin"},
            {"id": 2, "name": "Manoj", "email": "manoj@example.com", "role": "manager"},
            {"id": 3, "name": "Sunita", "email": "sunita@example.com", "role": "supervisor"},
            {"id": 7, "name": "Vikram", "email": "vikram@example.com", "role": "sales_agent", "supervisorId": 3},
            {"id": 8, "name": "Asha", "email": "asha@example.com", "role": "sales_agent", "supervisorId": 3},
            {"id": 9, "name": "Kiran", "email": "kiran@example.com", "role": "sales_agent"}
        ],
        "leads": [
            {"id": 1, "name": "Anil", "phone": "9000000001", "source": "web", "status": "new"},
            {"id": 2, "name": "Bina", "phone": "9000000002", "source": "web", "status": "assigned", "agentId": 7},
            {"id": 3, "name": "Chetan", "phone": "9000000003", "source": "referral", "status": "contacted", "agentId": 8},
            {"id": 4, "name": "Divya", "phone": "9000000004", "source": "web", "status": "interested", "agentId": 9},
            {"id": 5, "name": "Bina K", "phone": "90000-00002", "source": "web", "status": "new"}
        ]
    }"#;

    fn workspace_as(user_id: &str) -> Workspace {
        let data = CrmData::from_fixture(Fixture::from_json(FIXTURE).unwrap());
        let ws = Workspace::new(data, SessionContext::new());
        ws.login_as(user_id).unwrap();
        ws
    }

    fn ids(value: &Value) -> Vec<String> {
        value["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("status=new").unwrap(),
            ("status".to_string(), "new".to_string())
        );
        assert_eq!(
            parse_filter("source = walk in").unwrap(),
            ("source".to_string(), "walk in".to_string())
        );
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=new").is_err());
    }

    #[test]
    fn test_list_is_scoped_by_role() {
        let agent = workspace_as("7").list(Kind::Leads, &ListArgs::default()).unwrap();
        assert_eq!(ids(&agent), vec!["2"]);
        assert_eq!(agent["total"], 5);

        let supervisor = workspace_as("3").list(Kind::Leads, &ListArgs::default()).unwrap();
        assert_eq!(ids(&supervisor), vec!["2", "3"]);

        let manager = workspace_as("2").list(Kind::Leads, &ListArgs::default()).unwrap();
        assert_eq!(manager["count"], 5);
    }

    #[test]
    fn test_list_applies_filters() {
        let ws = workspace_as("2");
        let args = ListArgs {
            filters: vec![("status".to_string(), "new".to_string())],
            ..ListArgs::default()
        };
        assert_eq!(ids(&ws.list(Kind::Leads, &args).unwrap()), vec!["1", "5"]);

        let args = ListArgs {
            search: Some("bina".to_string()),
            ..ListArgs::default()
        };
        assert_eq!(ids(&ws.list(Kind::Leads, &args).unwrap()), vec!["2", "5"]);

        let args = ListArgs {
            filters: vec![("status".to_string(), "all".to_string())],
            ..ListArgs::default()
        };
        assert_eq!(ws.list(Kind::Leads, &args).unwrap()["count"], 5);
    }

    #[test]
    fn test_login_as_unknown_user_fails() {
        let data = CrmData::from_fixture(Fixture::from_json(FIXTURE).unwrap());
        let ws = Workspace::new(data, SessionContext::new());
        assert!(ws.login_as("404").is_err());
        assert!(!ws.session.is_logged_in());
    }

    #[test]
    fn test_agent_cannot_assign() {
        let mut ws = workspace_as("7");
        let err = ws.assign(Kind::Leads, "8", &strings(&["2"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrmError>(),
            Some(CrmError::Forbidden { .. })
        ));
        assert_eq!(ws.data.leads.len(), 5, "store restored after a refused mutation");
    }

    #[test]
    fn test_supervisor_assigns_within_team_only() {
        let mut ws = workspace_as("3");
        let result = ws.assign(Kind::Leads, "8", &strings(&["2", "4"])).unwrap();
        assert_eq!(result["assigned"], 1);
        assert_eq!(result["skipped"], json!(["4"]));
        assert_eq!(ws.data.leads.get("2").unwrap().agent_id.as_deref(), Some("8"));
        assert_eq!(ws.data.leads.get("4").unwrap().agent_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_assign_requires_active_agent() {
        let mut ws = workspace_as("2");
        assert!(ws.assign(Kind::Leads, "3", &strings(&["1"])).is_err());
        assert!(ws.assign(Kind::Users, "7", &strings(&["1"])).is_err());
    }

    #[test]
    fn test_set_status_parses_and_scopes() {
        let mut ws = workspace_as("7");
        let result = ws
            .set_status(Kind::Leads, "contacted", &strings(&["2", "3"]))
            .unwrap();
        assert_eq!(result["changed"], 1);
        assert_eq!(result["skipped"], json!(["3"]));

        assert!(ws.set_status(Kind::Leads, "bogus", &strings(&["2"])).is_err());
        assert!(ws.set_status(Kind::Users, "new", &strings(&["7"])).is_err());
    }

    #[test]
    fn test_delete_requires_manager() {
        let mut agent = workspace_as("7");
        assert!(agent.delete(Kind::Leads, &strings(&["2"])).is_err());

        let mut manager = workspace_as("2");
        let result = manager.delete(Kind::Leads, &strings(&["1", "42"])).unwrap();
        assert_eq!(result["deleted"], json!(["1"]));
        assert_eq!(result["skipped"], json!(["42"]));
        assert_eq!(manager.data.leads.len(), 4);
    }

    #[test]
    fn test_dedupe_keeps_first_phone() {
        let mut ws = workspace_as("2");
        let result = ws.dedupe(Kind::Leads).unwrap();
        assert_eq!(result["removed"], json!(["5"]));
        assert!(ws.data.leads.contains("2"));
    }

    #[test]
    fn test_stats_are_scoped() {
        let stats = workspace_as("7").stats().unwrap();
        assert_eq!(stats["leads"]["total"], 1);

        let stats = workspace_as("2").stats().unwrap();
        assert_eq!(stats["leads"]["total"], 5);
        assert_eq!(stats["leads"]["unassigned"], 2);
    }

    #[test]
    fn test_agent_owns_created_prospect() {
        let mut ws = workspace_as("7");
        let result = ws
            .create_prospect(Prospect::new("Meera", "9123456780"))
            .unwrap();
        assert_eq!(result["created"]["agent_id"], "7");

        let listed = ws.list(Kind::Prospects, &ListArgs::default()).unwrap();
        assert_eq!(listed["count"], 1);
    }

    #[test]
    fn test_list_refuses_screens_outside_navigation() {
        let err = workspace_as("7").list(Kind::Users, &ListArgs::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrmError>(),
            Some(CrmError::Forbidden { role: Role::SalesAgent, .. })
        ));

        let admin = workspace_as("1");
        let err = admin.list(Kind::Leads, &ListArgs::default()).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: Admin cannot view leads");
        assert_eq!(admin.list(Kind::Users, &ListArgs::default()).unwrap()["count"], 6);
        assert!(admin.stats().is_ok());

        let supervisor = workspace_as("3");
        assert!(supervisor.list(Kind::Users, &ListArgs::default()).is_ok());
    }

    #[test]
    fn test_admin_cannot_create_prospect() {
        let mut ws = workspace_as("1");
        assert!(ws.create_prospect(Prospect::new("Meera", "9123456780")).is_err());
        assert!(ws.data.prospects.is_empty());
    }

    #[test]
    fn test_remote_prospect_keeps_server_id() {
        let mut ws = workspace_as("2");
        let mut prospect = Prospect::new("Meera", "9123456780");
        prospect.id = "p-77".to_string();
        ws.record_remote_prospect(prospect).unwrap();
        assert!(ws.data.prospects.contains("p-77"));
    }
}
