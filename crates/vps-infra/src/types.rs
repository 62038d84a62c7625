use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque provider-side instance identifier (e.g. a numeric droplet id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId(pub String);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Live provider state ──────────────────────────────────────────────

/// Provider-reported power/lifecycle state. Only valid for the request
/// that fetched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    New,
    Active,
    Off,
    Archive,
    Unknown,
}

impl LiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Off => "off",
            Self::Archive => "archive",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a provider status string. Unrecognised values are `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "new" => Self::New,
            "active" => Self::Active,
            "off" => Self::Off,
            "archive" => Self::Archive,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instance as currently reported by the compute provider.
#[derive(Debug, Clone)]
pub struct InstanceSnapshot {
    pub external_id: ExternalId,
    pub name: String,
    pub status: LiveStatus,
    pub vcpus: Option<u32>,
    pub memory_mb: Option<u32>,
    pub disk_gb: Option<u32>,
    pub region: Option<String>,
    pub image: Option<String>,
    pub public_address: Option<String>,
    pub private_address: Option<String>,
}

// ── Actions ──────────────────────────────────────────────────────────

/// Actions a caller may request against an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Reboot,
    PowerOn,
    PowerOff,
    ResetCredentials,
}

impl ActionType {
    pub const ALL: [Self; 4] = [
        Self::Reboot,
        Self::PowerOn,
        Self::PowerOff,
        Self::ResetCredentials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::ResetCredentials => "reset_credentials",
        }
    }

    /// Name transmitted to the provider's action endpoint.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::ResetCredentials => "password_reset",
            other => other.as_str(),
        }
    }

    pub fn from_provider_name(raw: &str) -> Option<Self> {
        match raw {
            "reboot" => Some(Self::Reboot),
            "power_on" => Some(Self::PowerOn),
            "power_off" => Some(Self::PowerOff),
            "password_reset" => Some(Self::ResetCredentials),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    InProgress,
    Completed,
    Errored,
}

impl ActionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Reference into the provider's action log. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRef {
    pub id: u64,
    /// Public action name; provider actions outside [`ActionType`] keep
    /// their provider name.
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ActionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ── Order of record ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
    Expired,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct ProvisioningRecord {
    pub status: ProvisioningStatus,
    pub external_id: Option<ExternalId>,
    pub public_address: Option<String>,
    pub private_address: Option<String>,
    pub region: Option<String>,
    pub last_known_status: Option<LiveStatus>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub name: String,
    pub vcpus: u32,
    pub memory_mb: u32,
    pub disk_gb: u32,
}

/// An order as held by the order-of-record service.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub lifecycle: LifecycleStatus,
    pub provisioning: Option<ProvisioningRecord>,
    pub plan: Option<PlanSnapshot>,
    pub image: Option<String>,
    pub hostname: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Provider-side id, only for records that are ACTIVE and provisioned.
    pub fn actionable_external_id(&self) -> Option<&ExternalId> {
        if self.lifecycle != LifecycleStatus::Active {
            return None;
        }
        match &self.provisioning {
            Some(p) if p.status == ProvisioningStatus::Completed => p.external_id.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lifecycle: LifecycleStatus, status: ProvisioningStatus, ext: Option<&str>) -> ResourceRecord {
        ResourceRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            lifecycle,
            provisioning: Some(ProvisioningRecord {
                status,
                external_id: ext.map(|e| ExternalId(e.into())),
                public_address: None,
                private_address: None,
                region: None,
                last_known_status: None,
                completed_at: None,
            }),
            plan: None,
            image: None,
            hostname: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn actionable_requires_active_completed_and_external_id() {
        let ok = record(LifecycleStatus::Active, ProvisioningStatus::Completed, Some("1"));
        assert_eq!(ok.actionable_external_id(), Some(&ExternalId("1".into())));

        let no_ext = record(LifecycleStatus::Active, ProvisioningStatus::Completed, None);
        assert!(no_ext.actionable_external_id().is_none());

        let pending = record(LifecycleStatus::Active, ProvisioningStatus::InProgress, Some("1"));
        assert!(pending.actionable_external_id().is_none());

        let suspended = record(LifecycleStatus::Suspended, ProvisioningStatus::Completed, Some("1"));
        assert!(suspended.actionable_external_id().is_none());
    }

    #[test]
    fn reset_credentials_travels_as_password_reset() {
        assert_eq!(ActionType::ResetCredentials.provider_name(), "password_reset");
        assert_eq!(ActionType::PowerOn.provider_name(), "power_on");
        for action in ActionType::ALL {
            assert_eq!(ActionType::from_provider_name(action.provider_name()), Some(action));
        }
        assert_eq!(ActionType::from_provider_name("resize"), None);
    }

    #[test]
    fn unrecognised_live_status_is_unknown() {
        assert_eq!(LiveStatus::parse("off"), LiveStatus::Off);
        assert_eq!(LiveStatus::parse("rebooting"), LiveStatus::Unknown);
    }
}
