//! Typed Rust client for the compute provider's instance API.
//!
//! Covers the subset the control plane needs: fetch an instance,
//! trigger a power/credential action, poll an action.

mod types;

pub use types::*;

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("compute api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("compute api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the compute provider REST API.
#[derive(Clone)]
pub struct ComputeClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl ComputeClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Instances ────────────────────────────────────────────────────

    pub async fn get_instance(&self, instance_id: &str) -> Result<Instance> {
        let resp = self
            .http
            .get(self.url(&format!("/instances/{instance_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: InstanceEnvelope = Self::check(resp, "get instance").await?.json().await?;
        Ok(envelope.instance)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Trigger an action; `kind` is the provider's action name (e.g. `"power_on"`).
    pub async fn create_action(&self, instance_id: &str, kind: &str) -> Result<Action> {
        let resp = self
            .http
            .post(self.url(&format!("/instances/{instance_id}/actions")))
            .header("Authorization", self.auth())
            .json(&CreateActionRequest { kind })
            .send()
            .await?;

        let envelope: ActionEnvelope = Self::check(resp, "create action").await?.json().await?;
        Ok(envelope.action)
    }

    pub async fn get_action(&self, instance_id: &str, action_id: u64) -> Result<Action> {
        let resp = self
            .http
            .get(self.url(&format!("/instances/{instance_id}/actions/{action_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: ActionEnvelope = Self::check(resp, "get action").await?.json().await?;
        Ok(envelope.action)
    }
}
