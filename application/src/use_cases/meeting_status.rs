//! Meeting Status use case
//!
//! Read-only snapshot of a meeting: run state, speaking order, participants
//! and observer room.

use crate::services::{
    CouncilServices, ParticipantRegistry, RoomInfo, RoomManager, RunController, RunStatusView,
    TurnScheduler,
};
use council_domain::{MeetingId, Participant, SpeakingOrderSnapshot};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of a meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingStatus {
    pub run: RunStatusView,
    pub speaking_order: Option<SpeakingOrderSnapshot>,
    pub participants: Vec<Participant>,
    pub room: RoomInfo,
}

/// Use case for reading a meeting's status
pub struct MeetingStatusUseCase {
    registry: Arc<ParticipantRegistry>,
    scheduler: Arc<TurnScheduler>,
    controller: Arc<RunController>,
    rooms: Arc<RoomManager>,
}

impl MeetingStatusUseCase {
    pub fn from_services(services: &CouncilServices) -> Self {
        Self {
            registry: Arc::clone(&services.registry),
            scheduler: Arc::clone(&services.scheduler),
            controller: Arc::clone(&services.controller),
            rooms: Arc::clone(&services.rooms),
        }
    }

    pub async fn execute(&self, meeting_id: &MeetingId) -> MeetingStatus {
        let run = self.controller.status(meeting_id).await;
        let speaking_order = match &run.run_id {
            Some(run_id) if run.state.is_active() => self.scheduler.speaking_order(run_id).await,
            _ => None,
        };
        MeetingStatus {
            run,
            speaking_order,
            participants: self.registry.list(meeting_id).await,
            room: self.rooms.room_info(meeting_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CouncilConfig;
    use crate::ports::event_journal::NoEventJournal;
    use crate::testing::MockStore;
    use crate::use_cases::control_meeting::ControlMeetingUseCase;
    use crate::use_cases::start_meeting::StartMeetingUseCase;
    use council_domain::{AgentId, ControlAction, ParticipantRole, RunState};

    #[tokio::test]
    async fn test_status_follows_the_run() {
        let services = CouncilServices::new(&CouncilConfig::default(), Arc::new(NoEventJournal));
        let store = Arc::new(MockStore::default().with_meeting(
            "m1",
            vec![
                Participant::new("moderator", "m1", ParticipantRole::Moderator),
                Participant::new("scribe", "m1", ParticipantRole::Scribe),
            ],
        ));
        let status = MeetingStatusUseCase::from_services(&services);
        let m1 = MeetingId::new("m1");

        let idle = status.execute(&m1).await;
        assert_eq!(idle.run.state, RunState::Idle);
        assert!(idle.speaking_order.is_none());
        assert!(!idle.room.is_active);

        StartMeetingUseCase::from_services(store.clone(), &services)
            .execute(&m1)
            .await
            .unwrap();
        let running = status.execute(&m1).await;
        assert_eq!(running.run.state, RunState::Running);
        assert_eq!(running.participants.len(), 2);
        assert_eq!(
            running.speaking_order.unwrap().current_speaker,
            Some(AgentId::new("moderator"))
        );

        ControlMeetingUseCase::from_services(store, &services)
            .execute(&m1, ControlAction::Stop)
            .await
            .unwrap();
        let stopped = status.execute(&m1).await;
        assert_eq!(stopped.run.state, RunState::Stopped);
        assert!(stopped.speaking_order.is_none());
        assert!(stopped.run.run_id.is_some());
    }
}
