//! Instance action control plane.
//!
//! Reconciles a caller's request against the order of record and the
//! provider's live state, gates it through the action state machine and
//! the per-resource rate limiter, then hands it to the provider.

pub mod error;
pub mod orchestrator;
pub mod rate_limit;
pub mod validator;

pub use error::ControlError;
pub use orchestrator::{
    ConsoleAccess, Orchestrator, Page, PageMeta, ResourceDetail, ResourceSummary, StatusSource,
};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimited, RateLimiter};
pub use validator::{ActionRejected, validate};
