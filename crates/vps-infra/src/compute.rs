use std::time::Duration;

use async_trait::async_trait;
use compute_api::ComputeClient;
use tracing::{error, info};

use crate::types::{ActionRef, ActionStatus, ActionType, ExternalId, InstanceSnapshot, LiveStatus};
use crate::{ComputeProvider, ProviderError, ProviderErrorKind, Result, env_required, env_u64};

/// Compute provider reached over its REST API.
///
/// Delegates to `compute_api::ComputeClient` for all HTTP calls and
/// narrows every failure to a [`ProviderErrorKind`].
pub struct HttpComputeProvider {
    client: ComputeClient,
    console_base: String,
}

impl HttpComputeProvider {
    /// Create from env vars:
    ///
    /// - `PROVIDER_API_URL` (required)
    /// - `PROVIDER_API_TOKEN` (required)
    /// - `PROVIDER_TIMEOUT_SECS` (default: `30`)
    /// - `PROVIDER_CONSOLE_URL` (default: `PROVIDER_API_URL`)
    pub fn from_env() -> Result<Self> {
        let base_url = env_required("PROVIDER_API_URL")?;
        let token = env_required("PROVIDER_API_TOKEN")?;
        let timeout = Duration::from_secs(env_u64("PROVIDER_TIMEOUT_SECS", 30)?);
        let console_base = std::env::var("PROVIDER_CONSOLE_URL").unwrap_or_else(|_| base_url.clone());

        Ok(Self::new(ComputeClient::new(base_url, token, timeout)?, console_base))
    }

    pub fn new(client: ComputeClient, console_base: impl Into<String>) -> Self {
        Self {
            client,
            console_base: console_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    fn console_url(&self, id: &ExternalId) -> String {
        format!("{}/instances/{id}/console", self.console_base)
    }

    fn snapshot(instance: compute_api::Instance) -> InstanceSnapshot {
        let public_address = instance.address("public").map(str::to_string);
        let private_address = instance.address("private").map(str::to_string);

        InstanceSnapshot {
            external_id: ExternalId(instance.id.to_string()),
            status: LiveStatus::parse(&instance.status),
            name: instance.name,
            vcpus: instance.vcpus,
            memory_mb: instance.memory,
            disk_gb: instance.disk,
            region: instance.region.map(|r| r.slug),
            image: instance
                .image
                .and_then(|i| i.name.or(i.distribution)),
            public_address,
            private_address,
        }
    }

    fn action_ref(action: compute_api::Action) -> ActionRef {
        let kind = ActionType::from_provider_name(&action.kind)
            .map(|t| t.as_str().to_string())
            .unwrap_or(action.kind);

        ActionRef {
            id: action.id,
            kind,
            status: match action.status {
                compute_api::ActionStatus::InProgress => ActionStatus::InProgress,
                compute_api::ActionStatus::Completed => ActionStatus::Completed,
                compute_api::ActionStatus::Errored => ActionStatus::Errored,
            },
            started_at: action.started_at,
            completed_at: action.completed_at,
        }
    }

    /// Map an HTTP status to its failure kind.
    fn classify_status(status: u16) -> ProviderErrorKind {
        match status {
            401 | 403 => ProviderErrorKind::Unauthorized,
            404 => ProviderErrorKind::NotFound,
            422 => ProviderErrorKind::Unprocessable,
            other => ProviderErrorKind::UnknownUpstream(other),
        }
    }

    fn classify(err: &compute_api::Error) -> ProviderErrorKind {
        match err {
            compute_api::Error::Api { status, .. } => Self::classify_status(status.as_u16()),
            compute_api::Error::Request(_) => ProviderErrorKind::Unavailable,
        }
    }

    fn map_err<'a>(
        operation: &'static str,
        id: &'a ExternalId,
    ) -> impl FnOnce(compute_api::Error) -> ProviderError + 'a {
        move |err| {
            let kind = Self::classify(&err);
            if kind == ProviderErrorKind::Unauthorized {
                error!(operation, external_id = %id, error = %err, "provider rejected credentials");
            }
            ProviderError::new(kind, operation)
        }
    }
}

#[async_trait]
impl ComputeProvider for HttpComputeProvider {
    async fn get_instance(&self, id: &ExternalId) -> std::result::Result<InstanceSnapshot, ProviderError> {
        let instance = self
            .client
            .get_instance(&id.0)
            .await
            .map_err(Self::map_err("get instance", id))?;
        Ok(Self::snapshot(instance))
    }

    async fn submit_action(
        &self,
        id: &ExternalId,
        action: ActionType,
    ) -> std::result::Result<ActionRef, ProviderError> {
        let created = self
            .client
            .create_action(&id.0, action.provider_name())
            .await
            .map_err(Self::map_err("submit action", id))?;

        info!(external_id = %id, action = %action, action_id = created.id, "provider: action submitted");
        Ok(Self::action_ref(created))
    }

    async fn get_action_status(
        &self,
        id: &ExternalId,
        action_id: u64,
    ) -> std::result::Result<ActionRef, ProviderError> {
        let action = self
            .client
            .get_action(&id.0, action_id)
            .await
            .map_err(Self::map_err("get action", id))?;
        Ok(Self::action_ref(action))
    }

    async fn get_console_url(
        &self,
        id: &ExternalId,
    ) -> std::result::Result<(String, LiveStatus), ProviderError> {
        let snapshot = self.get_instance(id).await?;
        Ok((self.console_url(id), snapshot.status))
    }
}
