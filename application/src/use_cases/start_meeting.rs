//! Start Meeting use case
//!
//! Seats a meeting's participants, starts a new run and builds its
//! speaking order. Observers see `run_status: started` followed by one
//! `participant_updated` per seat.

use crate::error::CouncilError;
use crate::ports::meeting_store::MeetingStore;
use crate::services::{CouncilServices, EventSink, RunController, TurnScheduler, TurnUpdate};
use crate::use_cases::shared::publish_status_changes;
use council_domain::{DomainError, MeetingId, Run, SpeakingOrderSnapshot};
use std::sync::Arc;
use tracing::{info, warn};

/// Output of the [`StartMeetingUseCase`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMeetingOutput {
    pub run: Run,
    pub order: SpeakingOrderSnapshot,
}

/// Use case for starting a run of a meeting
pub struct StartMeetingUseCase {
    store: Arc<dyn MeetingStore>,
    scheduler: Arc<TurnScheduler>,
    controller: Arc<RunController>,
    events: Arc<dyn EventSink>,
}

impl StartMeetingUseCase {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        scheduler: Arc<TurnScheduler>,
        controller: Arc<RunController>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            scheduler,
            controller,
            events,
        }
    }

    pub fn from_services(store: Arc<dyn MeetingStore>, services: &CouncilServices) -> Self {
        Self::new(
            store,
            Arc::clone(&services.scheduler),
            Arc::clone(&services.controller),
            services.events(),
        )
    }

    /// Load the meeting's participants, then start the run, seat them and
    /// build the speaking order in one controller critical section.
    /// A rejected start leaves the registry untouched.
    pub async fn execute(&self, meeting_id: &MeetingId) -> Result<StartMeetingOutput, CouncilError> {
        let participants = self.store.load_participants(meeting_id).await?;
        if participants.is_empty() {
            return Err(DomainError::EmptyParticipantSet.into());
        }

        let scheduler = &self.scheduler;
        let events = self.events.as_ref();
        let (run, update) = self
            .controller
            .start_run_with(meeting_id, |run| async move {
                let registry = scheduler.registry();
                for mut participant in participants {
                    participant.meeting_id = run.meeting_id.clone();
                    registry.join(participant).await;
                }
                let seated = registry.list(&run.meeting_id).await;
                let update = scheduler
                    .create_speaking_order(&run.meeting_id, &run.run_id, &seated)
                    .await?;
                publish_status_changes(events, &run.meeting_id, &update.changes);
                Ok::<TurnUpdate, DomainError>(update)
            })
            .await?;

        if let Err(e) = self.store.save_run(&run).await {
            warn!(run_id = %run.run_id, error = %e, "Failed to persist run");
        }

        info!(
            meeting_id = %meeting_id,
            run_id = %run.run_id,
            participants = update.order.order.len(),
            "Meeting started"
        );
        Ok(StartMeetingOutput {
            run,
            order: update.order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ParticipantRegistry;
    use crate::testing::{MockStore, RecordingSink};
    use crate::use_cases::control_meeting::ControlMeetingUseCase;
    use council_domain::{AgentId, ControlAction, Participant, ParticipantRole, RunState};

    struct Fixture {
        use_case: StartMeetingUseCase,
        scheduler: Arc<TurnScheduler>,
        controller: Arc<RunController>,
        sink: Arc<RecordingSink>,
        store: Arc<MockStore>,
    }

    fn fixture(store: MockStore) -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(store);
        let scheduler = Arc::new(TurnScheduler::new(Arc::new(ParticipantRegistry::new())));
        let controller = Arc::new(RunController::new(sink.clone()));
        Fixture {
            use_case: StartMeetingUseCase::new(
                store.clone(),
                Arc::clone(&scheduler),
                Arc::clone(&controller),
                sink.clone(),
            ),
            scheduler,
            controller,
            sink,
            store,
        }
    }

    fn m1_store() -> MockStore {
        MockStore::default().with_meeting(
            "m1",
            vec![
                Participant::new("expert2", "m1", ParticipantRole::Expert),
                Participant::new("expert1", "m1", ParticipantRole::Expert),
                Participant::new("moderator", "m1", ParticipantRole::Moderator),
            ],
        )
    }

    #[tokio::test]
    async fn test_start_builds_order_and_emits_in_order() {
        let f = fixture(m1_store());
        let output = f.use_case.execute(&MeetingId::new("m1")).await.unwrap();

        assert_eq!(output.run.state, RunState::Running);
        assert_eq!(output.order.current_speaker, Some(AgentId::new("moderator")));
        assert_eq!(output.order.next_speaker, Some(AgentId::new("expert1")));
        assert_eq!(output.order.round, 1);

        assert_eq!(
            f.sink.event_types(),
            vec![
                "run_status",
                "participant_status",
                "participant_status",
                "participant_status"
            ]
        );
        assert_eq!(f.store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_state_conflict() {
        let f = fixture(m1_store());
        f.use_case.execute(&MeetingId::new("m1")).await.unwrap();
        let err = f.use_case.execute(&MeetingId::new("m1")).await.unwrap_err();
        assert!(matches!(
            err,
            CouncilError::Domain(DomainError::AlreadyRunning(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_start_leaves_seating_unchanged() {
        let f = fixture(m1_store());
        let m1 = MeetingId::new("m1");
        let first = f.use_case.execute(&m1).await.unwrap();

        let grown = MockStore::default().with_meeting(
            "m1",
            vec![
                Participant::new("moderator", "m1", ParticipantRole::Moderator),
                Participant::new("expert1", "m1", ParticipantRole::Expert),
                Participant::new("expert2", "m1", ParticipantRole::Expert),
                Participant::new("expert3", "m1", ParticipantRole::Expert),
            ],
        );
        let second = StartMeetingUseCase::new(
            Arc::new(grown),
            Arc::clone(&f.scheduler),
            Arc::clone(&f.controller),
            f.sink.clone(),
        );
        let err = second.execute(&m1).await.unwrap_err();
        assert!(matches!(
            err,
            CouncilError::Domain(DomainError::AlreadyRunning(_))
        ));

        let seated: Vec<AgentId> = f
            .scheduler
            .registry()
            .list(&m1)
            .await
            .into_iter()
            .map(|p| p.agent_id)
            .collect();
        assert_eq!(seated.len(), first.order.order.len());
        assert!(!seated.contains(&AgentId::new("expert3")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_handoff_racing_start_never_misses_order() {
        for _ in 0..100 {
            let f = fixture(m1_store());
            let store = Arc::clone(&f.store);
            let control = Arc::new(ControlMeetingUseCase::new(
                store,
                Arc::clone(&f.scheduler),
                Arc::clone(&f.controller),
                f.sink.clone(),
            ));
            let controller = Arc::clone(&f.controller);

            let handoff = tokio::spawn(async move {
                let m1 = MeetingId::new("m1");
                while controller.state(&m1).await == RunState::Idle {
                    tokio::task::yield_now().await;
                }
                control.execute(&m1, ControlAction::Handoff).await
            });
            f.use_case.execute(&MeetingId::new("m1")).await.unwrap();

            let outcome = handoff.await.unwrap().unwrap();
            assert!(outcome.accepted);
            assert_eq!(
                outcome.order.unwrap().current_speaker,
                Some(AgentId::new("expert1"))
            );
        }
    }

    #[tokio::test]
    async fn test_empty_meeting_does_not_start() {
        let f = fixture(MockStore::default().with_meeting("empty", vec![]));
        let err = f
            .use_case
            .execute(&MeetingId::new("empty"))
            .await
            .unwrap_err();
        assert_eq!(err, CouncilError::Domain(DomainError::EmptyParticipantSet));
        assert_eq!(
            f.controller.state(&MeetingId::new("empty")).await,
            RunState::Idle
        );
        assert!(f.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_meeting_is_store_error() {
        let f = fixture(MockStore::default());
        let err = f.use_case.execute(&MeetingId::new("m9")).await.unwrap_err();
        assert!(matches!(err, CouncilError::Store(_)));
    }
}
