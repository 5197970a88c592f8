//! Speaking order: the deterministic turn rotation of a run.
//!
//! Participants are sorted by `(role priority, agent id)`, so the same
//! participant set always yields the same rotation regardless of the order
//! in which participants joined.

use crate::core::error::DomainError;
use crate::core::ids::{AgentId, MeetingId, RunId};
use crate::participant::entities::{Participant, ParticipantRole, ParticipantStatus, StatusChange};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Seat {
    agent_id: AgentId,
    role: ParticipantRole,
}

/// Rotation of speakers for one run (Entity)
///
/// `current` always indexes into `seats`, which is never empty, so the
/// current and next speakers are always members of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "SpeakingOrderSnapshot")]
pub struct SpeakingOrder {
    meeting_id: MeetingId,
    run_id: RunId,
    seats: Vec<Seat>,
    current: usize,
    round: u32,
}

/// Serialized shape of a [`SpeakingOrder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakingOrderSnapshot {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub order: Vec<AgentId>,
    pub current_speaker: Option<AgentId>,
    pub next_speaker: Option<AgentId>,
    pub round: u32,
}

impl From<SpeakingOrder> for SpeakingOrderSnapshot {
    fn from(order: SpeakingOrder) -> Self {
        Self {
            current_speaker: Some(order.current_speaker().clone()),
            next_speaker: order.next_speaker().cloned(),
            order: order.order(),
            round: order.round,
            meeting_id: order.meeting_id,
            run_id: order.run_id,
        }
    }
}

impl SpeakingOrder {
    /// Build the rotation for a run and the initial statuses of every participant.
    ///
    /// `order[0]` speaks, `order[1]` (if any) is next, everyone else waits.
    pub fn build(
        meeting_id: MeetingId,
        run_id: RunId,
        participants: &[Participant],
    ) -> Result<(Self, Vec<StatusChange>), DomainError> {
        if participants.is_empty() {
            return Err(DomainError::EmptyParticipantSet);
        }

        // One seat per agent; a later entry replaces an earlier one, as a
        // rejoin does in the registry.
        let mut seated: BTreeMap<&AgentId, &Participant> = BTreeMap::new();
        for participant in participants {
            seated.insert(&participant.agent_id, participant);
        }
        let mut sorted: Vec<&Participant> = seated.into_values().collect();
        sorted.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        let seats: Vec<Seat> = sorted
            .into_iter()
            .map(|p| Seat {
                agent_id: p.agent_id.clone(),
                role: p.role,
            })
            .collect();

        let changes = seats
            .iter()
            .enumerate()
            .map(|(i, seat)| StatusChange {
                agent_id: seat.agent_id.clone(),
                role: seat.role,
                status: match i {
                    0 => ParticipantStatus::Speaking,
                    1 => ParticipantStatus::Next,
                    _ => ParticipantStatus::Waiting,
                },
            })
            .collect();

        let order = Self {
            meeting_id,
            run_id,
            seats,
            current: 0,
            round: 1,
        };
        Ok((order, changes))
    }

    /// Hand the floor to the next participant.
    ///
    /// The round increments whenever the rotation wraps back to index 0,
    /// so a single-seat order starts a new round on every call. Returns the
    /// status changes in application order, one per affected participant.
    pub fn advance(&mut self) -> Vec<StatusChange> {
        let len = self.seats.len();
        let previous = self.current;
        let next_idx = (previous + 1) % len;
        let after_next_idx = (next_idx + 1) % len;

        self.current = next_idx;
        if next_idx == 0 {
            self.round += 1;
        }

        let mut changes = Vec::with_capacity(3);
        if previous != next_idx && previous != after_next_idx {
            changes.push(self.change(previous, ParticipantStatus::Waiting));
        }
        changes.push(self.change(next_idx, ParticipantStatus::Speaking));
        if after_next_idx != next_idx {
            changes.push(self.change(after_next_idx, ParticipantStatus::Next));
        }
        changes
    }

    fn change(&self, idx: usize, status: ParticipantStatus) -> StatusChange {
        let seat = &self.seats[idx];
        StatusChange {
            agent_id: seat.agent_id.clone(),
            role: seat.role,
            status,
        }
    }

    pub fn meeting_id(&self) -> &MeetingId {
        &self.meeting_id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Agent ids in speaking order.
    pub fn order(&self) -> Vec<AgentId> {
        self.seats.iter().map(|s| s.agent_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn current_speaker(&self) -> &AgentId {
        &self.seats[self.current].agent_id
    }

    pub fn current_role(&self) -> ParticipantRole {
        self.seats[self.current].role
    }

    /// The participant after the current one; for a single seat this is
    /// the current speaker again.
    pub fn next_speaker(&self) -> Option<&AgentId> {
        let idx = (self.current + 1) % self.seats.len();
        self.seats.get(idx).map(|s| &s.agent_id)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.seats.iter().any(|s| &s.agent_id == agent_id)
    }

    pub fn snapshot(&self) -> SpeakingOrderSnapshot {
        self.clone().into()
    }
}
