//! Participant registry
//!
//! Per meeting, the set of participants and their current turn status.
//! Participants are keyed by agent id, so joining twice never seats an
//! agent twice.

use council_domain::{
    AgentId, DomainError, MeetingId, Participant, ParticipantStatus, StatusChange,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

type Seating = BTreeMap<AgentId, Participant>;

/// In-process registry of meeting participants
#[derive(Default)]
pub struct ParticipantRegistry {
    meetings: RwLock<HashMap<MeetingId, Seating>>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat a participant in its meeting.
    ///
    /// A rejoin replaces name, role and tool metadata but keeps the current
    /// status. Returns `true` if the participant was not seated before.
    pub async fn join(&self, participant: Participant) -> bool {
        let mut meetings = self.meetings.write().await;
        let seating = meetings.entry(participant.meeting_id.clone()).or_default();
        match seating.get_mut(&participant.agent_id) {
            Some(existing) => {
                let status = existing.status;
                *existing = Participant {
                    status,
                    ..participant
                };
                false
            }
            None => {
                debug!(
                    meeting_id = %participant.meeting_id,
                    agent_id = %participant.agent_id,
                    role = %participant.role,
                    "Participant joined"
                );
                seating.insert(participant.agent_id.clone(), participant);
                true
            }
        }
    }

    pub async fn get(&self, meeting_id: &MeetingId, agent_id: &AgentId) -> Option<Participant> {
        let meetings = self.meetings.read().await;
        meetings.get(meeting_id)?.get(agent_id).cloned()
    }

    /// Participants of a meeting, sorted by agent id.
    pub async fn list(&self, meeting_id: &MeetingId) -> Vec<Participant> {
        let meetings = self.meetings.read().await;
        meetings
            .get(meeting_id)
            .map(|seating| seating.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn update_status(
        &self,
        meeting_id: &MeetingId,
        agent_id: &AgentId,
        status: ParticipantStatus,
    ) -> Result<Participant, DomainError> {
        let mut meetings = self.meetings.write().await;
        let participant = meetings
            .get_mut(meeting_id)
            .and_then(|seating| seating.get_mut(agent_id))
            .ok_or_else(|| DomainError::not_found("participant", agent_id))?;
        participant.status = status;
        Ok(participant.clone())
    }

    /// Apply a batch of status changes atomically.
    ///
    /// Either every change is applied or, if any agent is not seated in the
    /// meeting, none is.
    pub async fn set_statuses(
        &self,
        meeting_id: &MeetingId,
        changes: &[StatusChange],
    ) -> Result<(), DomainError> {
        let mut meetings = self.meetings.write().await;
        let seating = meetings
            .get_mut(meeting_id)
            .ok_or_else(|| DomainError::not_found("meeting", meeting_id))?;

        if let Some(missing) = changes.iter().find(|c| !seating.contains_key(&c.agent_id)) {
            return Err(DomainError::not_found("participant", &missing.agent_id));
        }
        for change in changes {
            if let Some(participant) = seating.get_mut(&change.agent_id) {
                participant.status = change.status;
            }
        }
        Ok(())
    }

    /// Set every participant of a meeting to `status`.
    ///
    /// Returns the changes for participants whose status actually changed.
    pub async fn reset_statuses(
        &self,
        meeting_id: &MeetingId,
        status: ParticipantStatus,
    ) -> Vec<StatusChange> {
        let mut meetings = self.meetings.write().await;
        let Some(seating) = meetings.get_mut(meeting_id) else {
            return Vec::new();
        };
        seating
            .values_mut()
            .filter(|p| p.status != status)
            .map(|p| {
                p.status = status;
                StatusChange {
                    agent_id: p.agent_id.clone(),
                    role: p.role,
                    status,
                }
            })
            .collect()
    }

    /// Number of participants of a meeting with the given status.
    pub async fn count_with_status(
        &self,
        meeting_id: &MeetingId,
        status: ParticipantStatus,
    ) -> usize {
        let meetings = self.meetings.read().await;
        meetings
            .get(meeting_id)
            .map(|seating| seating.values().filter(|p| p.status == status).count())
            .unwrap_or(0)
    }
}
