use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Envelopes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ListOrdersResponse {
    pub data: Vec<OrderRecord>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Matching orders across all pages.
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub data: OrderRecord,
}

// ── Orders ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[serde(default)]
    pub provisioning: Option<Provisioning>,
    #[serde(default)]
    pub plan: Option<PlanSnapshot>,
    #[serde(default)]
    pub image: Option<ImageSnapshot>,
    #[serde(default)]
    pub hostname: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioning {
    pub status: ProvisioningStatus,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Provider status observed when the record was last synced.
    #[serde(default)]
    pub last_known_status: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub name: String,
    pub cpu: u32,
    /// Memory in MB.
    pub memory: u32,
    /// Disk in GB.
    pub disk: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSnapshot {
    pub name: String,
}
