use vps_infra::OwnershipError;

/// Caller-facing failure taxonomy. Messages are safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("resource not found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("{0}")]
    ActionNotAllowed(String),

    #[error("action not found")]
    ActionNotFound,

    #[error("too many actions on this resource, retry in {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("upstream service unavailable")]
    UpstreamUnavailable,
}

impl ControlError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ActionNotAllowed(_) => "ACTION_NOT_ALLOWED",
            Self::ActionNotFound => "ACTION_NOT_FOUND",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
        }
    }
}

impl From<OwnershipError> for ControlError {
    fn from(_: OwnershipError) -> Self {
        Self::UpstreamUnavailable
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ControlError::NotFound.code(), "NOT_FOUND");
        assert_eq!(
            ControlError::RateLimitExceeded { retry_after_secs: 3 }.code(),
            "RATE_LIMIT_EXCEEDED"
        );
        assert_eq!(
            ControlError::ActionNotAllowed("x".into()).to_string(),
            "x"
        );
    }

    #[test]
    fn ownership_failure_hides_context() {
        let err: ControlError = OwnershipError::UpstreamUnavailable {
            method: "get_resource",
            context: BTreeMap::from([("resource_id", "abc".to_string())]),
        }
        .into();
        assert_eq!(err, ControlError::UpstreamUnavailable);
        assert!(!err.to_string().contains("abc"));
    }
}
