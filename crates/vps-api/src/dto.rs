use serde::Deserialize;
use vps_infra::types::ActionType;

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
}

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(rename = "type")]
    pub action: ActionType,
}
