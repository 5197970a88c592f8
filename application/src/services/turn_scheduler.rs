//! Turn scheduler
//!
//! Builds and advances the speaking order of each run and mirrors every
//! turn change into the [`ParticipantRegistry`]. Orders are keyed by run id,
//! so two runs of the same meeting never share a rotation.
//!
//! The scheduler does not emit events itself: each mutation returns a
//! [`TurnUpdate`] and the caller publishes the status changes.

use crate::services::participant_registry::ParticipantRegistry;
use council_domain::{
    DomainError, MeetingId, Participant, ParticipantStatus, RunId, SpeakingOrder,
    SpeakingOrderSnapshot, StatusChange,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of a scheduler mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnUpdate {
    /// Order after the mutation
    pub order: SpeakingOrderSnapshot,
    /// Status changes in application order
    pub changes: Vec<StatusChange>,
}

/// Speaking-order service over the participant registry
pub struct TurnScheduler {
    registry: Arc<ParticipantRegistry>,
    orders: Mutex<HashMap<RunId, SpeakingOrder>>,
}

impl TurnScheduler {
    pub fn new(registry: Arc<ParticipantRegistry>) -> Self {
        Self {
            registry,
            orders: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ParticipantRegistry> {
        &self.registry
    }

    /// Build the speaking order of a run.
    ///
    /// Participants not yet seated are joined to the registry first. The
    /// first speaker becomes `speaking`, the second `next`, everyone else
    /// `waiting`. Building again for the same run replaces the order.
    pub async fn create_speaking_order(
        &self,
        meeting_id: &MeetingId,
        run_id: &RunId,
        participants: &[Participant],
    ) -> Result<TurnUpdate, DomainError> {
        let (order, changes) =
            SpeakingOrder::build(meeting_id.clone(), run_id.clone(), participants)?;

        let mut orders = self.orders.lock().await;
        for participant in participants {
            self.registry.join(participant.clone()).await;
        }
        self.registry.set_statuses(meeting_id, &changes).await?;

        info!(
            meeting_id = %meeting_id,
            run_id = %run_id,
            speakers = order.len(),
            first = %order.current_speaker(),
            "Speaking order created"
        );
        let snapshot = order.snapshot();
        orders.insert(run_id.clone(), order);
        Ok(TurnUpdate {
            order: snapshot,
            changes,
        })
    }

    /// Pass the floor to the next speaker of a run.
    pub async fn next_speaker(&self, run_id: &RunId) -> Result<TurnUpdate, DomainError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(run_id)
            .ok_or_else(|| DomainError::not_found("speaking order", run_id))?;

        let changes = order.advance();
        self.registry
            .set_statuses(order.meeting_id(), &changes)
            .await?;

        debug!(
            run_id = %run_id,
            speaker = %order.current_speaker(),
            round = order.round(),
            "Turn advanced"
        );
        Ok(TurnUpdate {
            order: order.snapshot(),
            changes,
        })
    }

    pub async fn speaking_order(&self, run_id: &RunId) -> Option<SpeakingOrderSnapshot> {
        let orders = self.orders.lock().await;
        orders.get(run_id).map(SpeakingOrder::snapshot)
    }

    /// Drop the order of a finished run and set its meeting's participants
    /// back to `waiting`.
    ///
    /// Returns the status changes, empty if the run had no order.
    pub async fn release(&self, run_id: &RunId) -> Vec<StatusChange> {
        let mut orders = self.orders.lock().await;
        let Some(order) = orders.remove(run_id) else {
            return Vec::new();
        };
        let changes = self
            .registry
            .reset_statuses(order.meeting_id(), ParticipantStatus::Waiting)
            .await;
        debug!(run_id = %run_id, reset = changes.len(), "Speaking order released");
        changes
    }
}
