use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vps_infra::types::{
    ActionRef, ActionType, ExternalId, InstanceSnapshot, LifecycleStatus, LiveStatus,
    ResourceRecord,
};
use vps_infra::{ComputeProvider, OwnershipResolver, ProviderError, ProviderErrorKind};

use crate::error::ControlError;
use crate::rate_limit::RateLimiter;
use crate::validator;

/// Console links are advisory for this long.
const CONSOLE_TTL_SECS: i64 = 3600;

// ── Views ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    /// Fetched from the provider during this request.
    Live,
    /// Fallback from the order record after a failed live fetch.
    Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub id: Uuid,
    pub external_id: ExternalId,
    pub name: String,
    pub status: LiveStatus,
    pub status_source: StatusSource,
    pub public_address: Option<String>,
    pub private_address: Option<String>,
    pub region: Option<String>,
    pub vcpus: Option<u32>,
    pub memory_mb: Option<u32>,
    pub disk_gb: Option<u32>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDetail {
    #[serde(flatten)]
    pub summary: ResourceSummary,
    pub plan_name: Option<String>,
    pub provisioned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleAccess {
    pub url: String,
    pub status: LiveStatus,
    pub expires_at: DateTime<Utc>,
    pub instructions: String,
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Public operations over a caller's instances.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ComputeProvider>,
    ownership: Arc<dyn OwnershipResolver>,
    limiter: Arc<dyn RateLimiter>,
    max_page_size: u32,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        ownership: Arc<dyn OwnershipResolver>,
        limiter: Arc<dyn RateLimiter>,
        max_page_size: u32,
    ) -> Self {
        Self {
            provider,
            ownership,
            limiter,
            max_page_size: max_page_size.max(1),
        }
    }

    /// One page of the owner's provisioned instances, enriched with live
    /// status where the provider answers. Enrichment failures degrade the
    /// affected item to its record status; they never fail the page.
    pub async fn list(
        &self,
        owner_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Page<ResourceSummary>, ControlError> {
        let page = page.max(1);
        let limit = limit.clamp(1, self.max_page_size);

        let records: Vec<(ResourceRecord, ExternalId)> = self
            .ownership
            .list_active_resources(owner_id)
            .await?
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .filter_map(|r| {
                let ext = r.actionable_external_id()?.clone();
                Some((r, ext))
            })
            .collect();

        let total = records.len();
        let total_pages = total.div_ceil(limit as usize);
        let skip = (page as usize - 1).saturating_mul(limit as usize);

        let items: Vec<_> = records.into_iter().skip(skip).take(limit as usize).collect();

        let fetches = items.iter().map(|(_, ext)| self.provider.get_instance(ext));
        let snapshots = join_all(fetches).await;

        let data = items
            .iter()
            .zip(snapshots)
            .map(|((record, ext), snapshot)| match snapshot {
                Ok(snapshot) => summarize(record, ext, Some(&snapshot)),
                Err(e) => {
                    warn!(
                        resource_id = %record.id,
                        external_id = %ext,
                        error = %e,
                        "live status enrichment failed, using record status"
                    );
                    summarize(record, ext, None)
                }
            })
            .collect();

        Ok(Page {
            data,
            meta: PageMeta {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    /// Single instance with a mandatory live fetch.
    pub async fn get_detail(&self, owner_id: Uuid, id: Uuid) -> Result<ResourceDetail, ControlError> {
        let (record, ext) = self.resolve(owner_id, id).await?;
        let snapshot = self
            .provider
            .get_instance(&ext)
            .await
            .map_err(|e| provider_failure(e, &ext))?;

        Ok(ResourceDetail {
            summary: summarize(&record, &ext, Some(&snapshot)),
            plan_name: record.plan.as_ref().map(|p| p.name.clone()),
            provisioned_at: record.provisioning.as_ref().and_then(|p| p.completed_at),
        })
    }

    /// Validate against live state, pass the rate limiter, then submit.
    pub async fn submit_action(
        &self,
        owner_id: Uuid,
        id: Uuid,
        action: ActionType,
    ) -> Result<ActionRef, ControlError> {
        let (_, ext) = self.resolve(owner_id, id).await?;

        let snapshot = self
            .provider
            .get_instance(&ext)
            .await
            .map_err(|e| provider_failure(e, &ext))?;

        if let Err(rejected) = validator::validate(snapshot.status, action) {
            debug!(%owner_id, resource_id = %id, %action, status = %snapshot.status, "action rejected by state machine");
            return Err(ControlError::ActionNotAllowed(rejected.reason));
        }

        if let Err(limited) = self.limiter.check_and_record(owner_id, id) {
            debug!(%owner_id, resource_id = %id, %action, retry_after_secs = limited.retry_after_secs, "action rate limited");
            return Err(ControlError::RateLimitExceeded {
                retry_after_secs: limited.retry_after_secs,
            });
        }

        let submitted = self
            .provider
            .submit_action(&ext, action)
            .await
            .map_err(|e| match e.kind {
                ProviderErrorKind::Unprocessable => {
                    debug!(external_id = %ext, %action, "provider refused action");
                    ControlError::ActionNotAllowed("action rejected by provider".into())
                }
                _ => provider_failure(e, &ext),
            })?;

        info!(%owner_id, resource_id = %id, %action, action_id = submitted.id, "action submitted");
        Ok(submitted)
    }

    /// Read-only passthrough to the provider's action log.
    pub async fn poll_action_status(
        &self,
        owner_id: Uuid,
        id: Uuid,
        action_id: u64,
    ) -> Result<ActionRef, ControlError> {
        let (_, ext) = self.resolve(owner_id, id).await?;

        self.provider
            .get_action_status(&ext, action_id)
            .await
            .map_err(|e| match e.kind {
                ProviderErrorKind::NotFound => ControlError::ActionNotFound,
                _ => provider_failure(e, &ext),
            })
    }

    pub async fn get_console_url(&self, owner_id: Uuid, id: Uuid) -> Result<ConsoleAccess, ControlError> {
        let record = self.authorize(owner_id, id).await?;
        if record.lifecycle != LifecycleStatus::Active {
            return Err(ControlError::NotFound);
        }
        let ext = match record.actionable_external_id() {
            Some(ext) => ext.clone(),
            None => {
                return Err(ControlError::ActionNotAllowed(
                    "console requires completed provisioning".into(),
                ));
            }
        };

        let (url, status) = self
            .provider
            .get_console_url(&ext)
            .await
            .map_err(|e| provider_failure(e, &ext))?;

        let instructions = if status == LiveStatus::Active {
            "Log in with the root credentials sent when the instance was provisioned."
        } else {
            "The instance is not running. Power it on before opening the console."
        };

        Ok(ConsoleAccess {
            url,
            status,
            expires_at: Utc::now() + chrono::Duration::seconds(CONSOLE_TTL_SECS),
            instructions: instructions.into(),
        })
    }

    /// Fetch the record and check ownership. Ownership is checked before
    /// any lifecycle check so non-owners learn nothing about its state.
    async fn authorize(&self, owner_id: Uuid, id: Uuid) -> Result<ResourceRecord, ControlError> {
        let record = self
            .ownership
            .get_resource(id)
            .await?
            .ok_or(ControlError::NotFound)?;

        if record.owner_id != owner_id {
            debug!(%owner_id, resource_id = %id, "access denied to foreign resource");
            return Err(ControlError::AccessDenied);
        }

        Ok(record)
    }

    /// Authorize, then require an ACTIVE, fully provisioned record.
    async fn resolve(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<(ResourceRecord, ExternalId), ControlError> {
        let record = self.authorize(owner_id, id).await?;
        let ext = record
            .actionable_external_id()
            .cloned()
            .ok_or(ControlError::NotFound)?;
        Ok((record, ext))
    }
}

/// Map a provider failure to the caller taxonomy, logging outages.
fn provider_failure(err: ProviderError, ext: &ExternalId) -> ControlError {
    match err.kind {
        ProviderErrorKind::NotFound => ControlError::NotFound,
        ProviderErrorKind::Unauthorized => {
            error!(operation = err.operation, external_id = %ext, "provider credentials rejected");
            ControlError::UpstreamUnavailable
        }
        ProviderErrorKind::Unprocessable
        | ProviderErrorKind::Unavailable
        | ProviderErrorKind::UnknownUpstream(_) => {
            error!(operation = err.operation, external_id = %ext, error = %err, "provider call failed");
            ControlError::UpstreamUnavailable
        }
    }
}

/// Merge a record with an optional live snapshot; live values win.
fn summarize(
    record: &ResourceRecord,
    ext: &ExternalId,
    snapshot: Option<&InstanceSnapshot>,
) -> ResourceSummary {
    let provisioning = record.provisioning.as_ref();
    let plan = record.plan.as_ref();

    let (status, status_source) = match snapshot {
        Some(s) => (s.status, StatusSource::Live),
        None => (
            provisioning
                .and_then(|p| p.last_known_status)
                .unwrap_or(LiveStatus::Active),
            StatusSource::Record,
        ),
    };

    let name = snapshot
        .map(|s| s.name.clone())
        .or_else(|| record.hostname.clone())
        .unwrap_or_else(|| ext.to_string());

    ResourceSummary {
        id: record.id,
        external_id: ext.clone(),
        name,
        status,
        status_source,
        public_address: snapshot
            .and_then(|s| s.public_address.clone())
            .or_else(|| provisioning.and_then(|p| p.public_address.clone())),
        private_address: snapshot
            .and_then(|s| s.private_address.clone())
            .or_else(|| provisioning.and_then(|p| p.private_address.clone())),
        region: snapshot
            .and_then(|s| s.region.clone())
            .or_else(|| provisioning.and_then(|p| p.region.clone())),
        vcpus: snapshot.and_then(|s| s.vcpus).or(plan.map(|p| p.vcpus)),
        memory_mb: snapshot.and_then(|s| s.memory_mb).or(plan.map(|p| p.memory_mb)),
        disk_gb: snapshot.and_then(|s| s.disk_gb).or(plan.map(|p| p.disk_gb)),
        image: record
            .image
            .clone()
            .or_else(|| snapshot.and_then(|s| s.image.clone())),
        created_at: record.created_at,
    }
}
