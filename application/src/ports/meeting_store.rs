//! Meeting store port
//!
//! Durable persistence of meetings, participants and runs lives outside this
//! workspace. The application only loads the seating of a meeting and
//! records run state changes.

use async_trait::async_trait;
use council_domain::{MeetingId, Participant, Run};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Durable store of meetings
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Load the participants seated in a meeting.
    async fn load_participants(&self, meeting_id: &MeetingId)
    -> Result<Vec<Participant>, StoreError>;

    /// Record the current state of a run.
    async fn save_run(&self, run: &Run) -> Result<(), StoreError>;
}
