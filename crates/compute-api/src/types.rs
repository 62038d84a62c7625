use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Instances ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceEnvelope {
    pub instance: Instance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub vcpus: Option<u32>,
    /// Memory in MB.
    #[serde(default)]
    pub memory: Option<u32>,
    /// Disk in GB.
    #[serde(default)]
    pub disk: Option<u32>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Instance {
    /// First address tagged `kind` (`"public"` or `"private"`).
    pub fn address(&self, kind: &str) -> Option<&str> {
        self.networks
            .iter()
            .find(|n| n.kind == kind)
            .map(|n| n.ip_address.as_str())
    }
}

// ── Actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateActionRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope {
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub id: u64,
    pub status: ActionStatus,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    #[serde(rename = "in_progress", alias = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "errored")]
    Errored,
}
