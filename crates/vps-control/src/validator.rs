//! Action state machine.
//!
//! `power_on` is legal only from `off`; every other action only from
//! `active`. Any other live status rejects everything, including
//! `unknown`. There is no local transitional state: in-flight work is
//! tracked by the provider's action, not here.

use vps_infra::types::{ActionType, LiveStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ActionRejected {
    pub reason: String,
}

/// The one live status from which `action` may be issued.
pub fn required_status(action: ActionType) -> LiveStatus {
    match action {
        ActionType::PowerOn => LiveStatus::Off,
        ActionType::PowerOff | ActionType::Reboot | ActionType::ResetCredentials => {
            LiveStatus::Active
        }
    }
}

pub fn validate(status: LiveStatus, action: ActionType) -> Result<(), ActionRejected> {
    let required = required_status(action);
    if status == required {
        return Ok(());
    }
    Err(ActionRejected {
        reason: format!("{action} requires status={required}"),
    })
}
