//! In-memory meeting store
//!
//! Keeps meeting seatings and the latest state of every run in process
//! memory. Used by the CLI and as the reference adapter for
//! [`MeetingStore`].

use async_trait::async_trait;
use council_application::{MeetingStore, StoreError};
use council_domain::{MeetingId, Participant, Run, RunId};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// [`MeetingStore`] backed by in-process maps
#[derive(Default)]
pub struct InMemoryMeetingStore {
    meetings: RwLock<HashMap<MeetingId, Vec<Participant>>>,
    runs: RwLock<HashMap<RunId, Run>>,
}

impl InMemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a meeting with its participants.
    pub fn with_meeting(
        mut self,
        meeting_id: impl Into<MeetingId>,
        participants: Vec<Participant>,
    ) -> Self {
        self.meetings.get_mut().insert(meeting_id.into(), participants);
        self
    }

    /// Create or replace a meeting's seating.
    pub async fn put_meeting(&self, meeting_id: MeetingId, participants: Vec<Participant>) {
        self.meetings.write().await.insert(meeting_id, participants);
    }

    /// Latest recorded state of a run.
    pub async fn run(&self, run_id: &RunId) -> Option<Run> {
        self.runs.read().await.get(run_id).cloned()
    }

    /// All recorded runs of a meeting, oldest first.
    pub async fn runs_of(&self, meeting_id: &MeetingId) -> Vec<Run> {
        let mut runs: Vec<Run> = self
            .runs
            .read()
            .await
            .values()
            .filter(|run| &run.meeting_id == meeting_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        runs
    }
}

#[async_trait]
impl MeetingStore for InMemoryMeetingStore {
    async fn load_participants(
        &self,
        meeting_id: &MeetingId,
    ) -> Result<Vec<Participant>, StoreError> {
        self.meetings
            .read()
            .await
            .get(meeting_id)
            .cloned()
            .ok_or_else(|| StoreError::MeetingNotFound(meeting_id.to_string()))
    }

    async fn save_run(&self, run: &Run) -> Result<(), StoreError> {
        debug!(run_id = %run.run_id, state = %run.state, "Saving run");
        self.runs.write().await.insert(run.run_id.clone(), run.clone());
        Ok(())
    }
}
