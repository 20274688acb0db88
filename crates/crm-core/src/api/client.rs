use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::constants::routes;
use crate::error::{CrmError, Result};
use crate::models::{Action, Prospect, Role};
use crate::session::SessionContext;
use crate::validation::Validate;

/// Client for the few backend calls the dashboard makes.
///
/// All routes resolve against one configured base URL, and the session's
/// bearer token is attached when present.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    session: SessionContext,
}

/// Responses come either bare or wrapped (`{"prospect": {...}}`, `{"data": {...}}`)
#[derive(Deserialize)]
#[serde(untagged)]
enum ProspectResponse {
    Wrapped {
        #[serde(alias = "data")]
        prospect: Prospect,
    },
    Bare(Prospect),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountResponse {
    Object {
        #[serde(alias = "newLeads", alias = "total")]
        count: u64,
    },
    Bare(u64),
}

impl ApiClient {
    pub fn new(config: &CoreConfig, session: SessionContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into `CrmError::Http` carrying the body
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "API request failed");
        Err(CrmError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// POST a new prospect. Agents creating a prospect own it.
    ///
    /// Returns the server's copy; its `id` is empty if the server did not
    /// issue one.
    pub async fn create_prospect(&self, prospect: &Prospect) -> Result<Prospect> {
        let session = self.session.require_action(Action::CreateRecord)?;
        prospect.validate().map_err(CrmError::Validation)?;

        let mut payload = prospect.clone();
        if payload.agent_id.is_none() && session.role == Role::SalesAgent {
            payload.agent_id = Some(session.user_id.clone());
        }

        let url = self.url(routes::PROSPECTS);
        debug!(%url, "creating prospect");
        let response = self
            .authorized(self.client.post(&url))
            .json(&payload)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;

        if body.trim().is_empty() {
            return Ok(payload);
        }
        parse_prospect(&body)
    }

    /// Number of leads still in `new` status for `agent_id`
    pub async fn new_leads_count(&self, agent_id: &str) -> Result<u64> {
        let url = self.url(routes::NEW_LEADS_COUNT);
        let response = self
            .authorized(self.client.get(&url).query(&[("agentId", agent_id)]))
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        parse_count(&body)
    }
}

fn parse_prospect(body: &str) -> Result<Prospect> {
    Ok(match serde_json::from_str::<ProspectResponse>(body)? {
        ProspectResponse::Wrapped { prospect } => prospect,
        ProspectResponse::Bare(prospect) => prospect,
    })
}

fn parse_count(body: &str) -> Result<u64> {
    Ok(match serde_json::from_str::<CountResponse>(body)? {
        CountResponse::Object { count } => count,
        CountResponse::Bare(count) => count,
    })
}
