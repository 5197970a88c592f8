//! Application error type
//!
//! [`CouncilError`] is what control-plane operations surface to the API
//! boundary. Nothing here is process-fatal: a failure concerns one meeting
//! and leaves every other room untouched.

use crate::ports::agent_runtime::AgentRuntimeError;
use crate::ports::connection::DeliveryError;
use crate::ports::meeting_store::StoreError;
use council_domain::{DomainError, ErrorKind};
use thiserror::Error;

/// Errors returned by council services and use cases
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CouncilError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Agent runtime error: {0}")]
    AgentRuntime(#[from] AgentRuntimeError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

impl CouncilError {
    /// Reporting class for domain failures; `None` for collaborator failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CouncilError::Domain(e) => Some(e.kind()),
            CouncilError::Store(StoreError::MeetingNotFound(_)) => Some(ErrorKind::NotFound),
            _ => None,
        }
    }

    /// Whether the caller sent something invalid (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        self.kind().is_some()
    }
}
