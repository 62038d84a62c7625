pub mod compute;
pub mod orders;
pub mod types;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use types::{ActionRef, ActionType, ExternalId, InstanceSnapshot, LiveStatus, ResourceRecord};

/// Construction-time errors: missing configuration or an unbuildable client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("compute client error: {0}")]
    Compute(#[from] compute_api::Error),

    #[error("orders client error: {0}")]
    Orders(#[from] orders_api::Error),

    #[error("missing env var: {0}")]
    MissingEnv(String),

    #[error("invalid env var: {0}")]
    InvalidEnv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Provider adapter ─────────────────────────────────────────────────

/// Closed set of compute-provider failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 404: instance or action absent.
    NotFound,
    /// Token rejected. A deployment misconfiguration, never shown to callers.
    Unauthorized,
    /// 422: the provider refused the action.
    Unprocessable,
    /// Connection refused, timeout, or unreadable response.
    Unavailable,
    /// Any other status.
    UnknownUpstream(u16),
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Unauthorized => f.write_str("unauthorized"),
            Self::Unprocessable => f.write_str("unprocessable"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::UnknownUpstream(status) => write!(f, "unexpected status {status}"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("provider {operation} failed: {kind}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub operation: &'static str,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, operation: &'static str) -> Self {
        Self { kind, operation }
    }
}

/// Typed seam over the remote compute provider.
#[async_trait]
pub trait ComputeProvider: Send + Sync + 'static {
    /// Fetch the live snapshot of an instance.
    async fn get_instance(&self, id: &ExternalId) -> std::result::Result<InstanceSnapshot, ProviderError>;

    /// Trigger an action. Returns the provider's action reference.
    async fn submit_action(
        &self,
        id: &ExternalId,
        action: ActionType,
    ) -> std::result::Result<ActionRef, ProviderError>;

    /// Poll a previously submitted action.
    async fn get_action_status(
        &self,
        id: &ExternalId,
        action_id: u64,
    ) -> std::result::Result<ActionRef, ProviderError>;

    /// Console link for an instance together with its live status.
    async fn get_console_url(
        &self,
        id: &ExternalId,
    ) -> std::result::Result<(String, LiveStatus), ProviderError>;
}

// ── Ownership resolver ───────────────────────────────────────────────

#[derive(Debug, Clone, thiserror::Error)]
pub enum OwnershipError {
    #[error("order service unavailable during {method}")]
    UpstreamUnavailable {
        method: &'static str,
        context: BTreeMap<&'static str, String>,
    },
}

/// Typed seam over the order-of-record service.
#[async_trait]
pub trait OwnershipResolver: Send + Sync + 'static {
    /// All ACTIVE records owned by `owner_id`.
    async fn list_active_resources(
        &self,
        owner_id: Uuid,
    ) -> std::result::Result<Vec<ResourceRecord>, OwnershipError>;

    /// One record by internal id; `None` when it does not exist.
    async fn get_resource(&self, id: Uuid) -> std::result::Result<Option<ResourceRecord>, OwnershipError>;
}

// ── Wiring ───────────────────────────────────────────────────────────

/// Both upstream adapters, constructed from the environment.
#[derive(Clone)]
pub struct Adapters {
    pub provider: Arc<dyn ComputeProvider>,
    pub ownership: Arc<dyn OwnershipResolver>,
}

/// Build the HTTP-backed adapters. Fails if either upstream is unconfigured.
pub fn build_adapters() -> Result<Adapters> {
    let provider = compute::HttpComputeProvider::from_env()?;
    tracing::info!(base_url = provider.base_url(), "registered compute provider adapter");

    let ownership = orders::HttpOwnershipResolver::from_env()?;
    tracing::info!("registered order-of-record resolver");

    Ok(Adapters {
        provider: Arc::new(provider),
        ownership: Arc::new(ownership),
    })
}

/// Read an optional numeric env var, falling back to `default`.
pub(crate) fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| Error::InvalidEnv(name.into())),
        Err(_) => Ok(default),
    }
}

pub(crate) fn env_required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::MissingEnv(name.into()))
}
