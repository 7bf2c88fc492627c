use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::HygieneConfig;
use crate::model::{IssueKey, RemoteIssue, ViewerIdentity};

const VIEWER_QUERY: &str = "query { viewer { id } }";

const ISSUE_QUERY: &str = "query($filter: IssueFilter) {
  issues(filter: $filter, first: 1) {
    nodes {
      identifier
      title
      state { name }
      assignee { id }
    }
  }
}";

/// Best-effort lookups against the issue tracker.
///
/// Implementations never fail: anything that goes wrong turns into an absent viewer or a
/// missing map entry.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Whether a credential is configured at all.
    fn is_configured(&self) -> bool;

    async fn resolve_viewer(&self) -> Option<ViewerIdentity>;

    /// Resolve each key independently. Keys that fail are left out of the result.
    async fn resolve_issues(&self, keys: &BTreeSet<IssueKey>) -> BTreeMap<IssueKey, RemoteIssue>;
}

#[async_trait]
impl<T: IssueTracker + ?Sized> IssueTracker for Arc<T> {
    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    async fn resolve_viewer(&self) -> Option<ViewerIdentity> {
        (**self).resolve_viewer().await
    }

    async fn resolve_issues(&self, keys: &BTreeSet<IssueKey>) -> BTreeMap<IssueKey, RemoteIssue> {
        (**self).resolve_issues(keys).await
    }
}

/// Tracker used when no credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTracker;

#[async_trait]
impl IssueTracker for DisabledTracker {
    fn is_configured(&self) -> bool {
        false
    }

    async fn resolve_viewer(&self) -> Option<ViewerIdentity> {
        None
    }

    async fn resolve_issues(&self, _keys: &BTreeSet<IssueKey>) -> BTreeMap<IssueKey, RemoteIssue> {
        BTreeMap::new()
    }
}

/// Pick the tracker implementation for a configuration.
pub fn tracker_from_config(config: &HygieneConfig) -> Arc<dyn IssueTracker> {
    match LinearClient::from_config(config) {
        Some(Ok(client)) => Arc::new(client),
        Some(Err(err)) => {
            log::warn!("Linear client unavailable ({err}); issue verification disabled");
            Arc::new(DisabledTracker)
        }
        None => Arc::new(DisabledTracker),
    }
}

#[derive(Error, Debug)]
enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0}ms")]
    Timeout(u128),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("response contained no data")]
    MissingData,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
struct IssueConnection {
    #[serde(default)]
    nodes: Vec<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    identifier: Option<String>,
    #[serde(default)]
    title: String,
    state: Option<StateNode>,
    assignee: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
struct StateNode {
    #[serde(default)]
    name: String,
}

/// Linear GraphQL client.
#[derive(Clone)]
pub struct LinearClient {
    http: Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
    concurrency: usize,
}

impl LinearClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &HygieneConfig) -> Option<Result<Self, reqwest::Error>> {
        let api_key = config.linear_api_key.clone()?;
        let http = match Client::builder().timeout(config.tracker_timeout).build() {
            Ok(http) => http,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(Self {
            http,
            api_url: config.linear_api_url.clone(),
            api_key,
            timeout: config.tracker_timeout,
            concurrency: config.tracker_concurrency.max(1),
        }))
    }

    async fn post<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, TrackerError> {
        let body = json!({ "query": query, "variables": variables });
        let request = async {
            let response = self
                .http
                .post(&self.api_url)
                .header(AUTHORIZATION, &self.api_key)
                .header(CONTENT_TYPE, "application/json")
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, reqwest::Error>(response.json::<GraphQlResponse<T>>().await?)
        };

        let parsed = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| TrackerError::Timeout(self.timeout.as_millis()))??;

        if let Some(first) = parsed.errors.first() {
            return Err(TrackerError::GraphQl(first.message.clone()));
        }
        parsed.data.ok_or(TrackerError::MissingData)
    }

    async fn fetch_issue(&self, key: &IssueKey, number: u64) -> Result<Option<RemoteIssue>, TrackerError> {
        let variables = json!({
            "filter": {
                "number": { "eq": number },
                "team": { "key": { "eq": key.team() } },
            }
        });
        let data: IssuesData = self.post(ISSUE_QUERY, variables).await?;
        let Some(node) = data.issues.nodes.into_iter().next() else {
            return Ok(None);
        };
        if let Some(identifier) = node.identifier.as_deref() {
            if identifier != key.as_str() {
                log::debug!("tracker returned {identifier} for {key}");
            }
        }
        Ok(Some(RemoteIssue {
            key: key.clone(),
            title: node.title,
            state_name: node.state.map(|s| s.name).unwrap_or_default(),
            assignee_id: node.assignee.map(|a| a.id),
        }))
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn resolve_viewer(&self) -> Option<ViewerIdentity> {
        match self.post::<ViewerData>(VIEWER_QUERY, json!({})).await {
            Ok(data) => data.viewer.map(|v| ViewerIdentity(v.id)),
            Err(err) => {
                log::warn!("Linear viewer lookup failed: {err}");
                None
            }
        }
    }

    async fn resolve_issues(&self, keys: &BTreeSet<IssueKey>) -> BTreeMap<IssueKey, RemoteIssue> {
        let mut resolved = BTreeMap::new();
        if keys.is_empty() {
            return resolved;
        }

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for key in keys {
            let Some(number) = key.number() else {
                log::debug!("skipping {key}: issue number out of range");
                continue;
            };
            let client = self.clone();
            let key = key.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                match client.fetch_issue(&key, number).await {
                    Ok(Some(issue)) => Some(issue),
                    Ok(None) => {
                        log::debug!("{key} not found in Linear");
                        None
                    }
                    Err(err) => {
                        log::warn!("Linear lookup for {key} failed: {err}");
                        None
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(issue)) if keys.contains(&issue.key) => {
                    resolved.insert(issue.key.clone(), issue);
                }
                Ok(_) => {}
                Err(err) => log::warn!("Linear lookup task failed: {err}"),
            }
        }
        resolved
    }
}
