//! Run Session use case
//!
//! Drives a meeting from start to stop: starts a run, lets speakers take
//! turns until the configured number of rounds is complete, then stops the
//! run. Control actions from other tasks (pause, resume, stop, handoff,
//! directives) interleave freely; while the run is paused the driver only
//! waits.

use crate::config::SessionParams;
use crate::error::CouncilError;
use crate::services::RunController;
use crate::use_cases::control_meeting::ControlMeetingUseCase;
use crate::use_cases::run_turn::{RunTurnUseCase, TurnOutcome};
use crate::use_cases::start_meeting::StartMeetingUseCase;
use council_domain::{ControlAction, DomainError, MeetingId, RunId, RunState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often a paused session re-checks its run state.
const PAUSE_POLL: Duration = Duration::from_millis(100);

/// Consecutive agent failures after which the session gives up.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// All configured rounds were spoken
    RoundsCompleted,
    /// The caller cancelled the session
    Cancelled,
    /// Someone else stopped the run
    StoppedExternally,
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub turns: u32,
    pub end: SessionEnd,
}

/// Use case for running a whole session
pub struct RunSessionUseCase {
    start: StartMeetingUseCase,
    turn: RunTurnUseCase,
    control: ControlMeetingUseCase,
    controller: Arc<RunController>,
    params: SessionParams,
}

impl RunSessionUseCase {
    pub fn new(
        start: StartMeetingUseCase,
        turn: RunTurnUseCase,
        control: ControlMeetingUseCase,
        controller: Arc<RunController>,
        params: SessionParams,
    ) -> Self {
        Self {
            start,
            turn,
            control,
            controller,
            params,
        }
    }

    pub async fn execute(
        &self,
        meeting_id: &MeetingId,
        cancel: CancellationToken,
    ) -> Result<SessionSummary, CouncilError> {
        let started = self.start.execute(meeting_id).await?;
        let run_id = started.run.run_id.clone();
        info!(
            meeting_id = %meeting_id,
            run_id = %run_id,
            rounds = self.params.rounds,
            "Session started"
        );

        let mut turns = 0u32;
        let mut failures = 0u32;
        let end = loop {
            if cancel.is_cancelled() {
                break SessionEnd::Cancelled;
            }

            match self.controller.state(meeting_id).await {
                RunState::Running => {}
                RunState::Paused => {
                    tokio::select! {
                        _ = cancel.cancelled() => break SessionEnd::Cancelled,
                        _ = tokio::time::sleep(PAUSE_POLL) => continue,
                    }
                }
                RunState::Idle | RunState::Stopped => break SessionEnd::StoppedExternally,
            }

            match self.turn.execute(meeting_id).await {
                Ok(TurnOutcome::Spoke { order, .. }) => {
                    turns += 1;
                    failures = 0;
                    if order.round > self.params.rounds {
                        break SessionEnd::RoundsCompleted;
                    }
                }
                Ok(TurnOutcome::Interrupted { state, .. }) => {
                    debug!(%state, "Turn interrupted");
                    continue;
                }
                Err(CouncilError::Domain(DomainError::NotRunning { .. })) => continue,
                Err(CouncilError::AgentRuntime(e)) => {
                    failures += 1;
                    warn!(error = %e, failures, "Agent turn failed");
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        self.stop(meeting_id).await;
                        return Err(e.into());
                    }
                }
                Err(e) => {
                    self.stop(meeting_id).await;
                    return Err(e);
                }
            }

            if !self.params.turn_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break SessionEnd::Cancelled,
                    _ = tokio::time::sleep(self.params.turn_delay) => {}
                }
            }
        };

        if end != SessionEnd::StoppedExternally {
            self.stop(meeting_id).await;
        }
        info!(meeting_id = %meeting_id, run_id = %run_id, turns, ?end, "Session ended");
        Ok(SessionSummary {
            meeting_id: meeting_id.clone(),
            run_id,
            turns,
            end,
        })
    }

    async fn stop(&self, meeting_id: &MeetingId) {
        if let Err(e) = self.control.execute(meeting_id, ControlAction::Stop).await {
            warn!(meeting_id = %meeting_id, error = %e, "Failed to stop run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent_runtime::{AgentRuntime, AgentRuntimeError, TurnContext};
    use crate::services::{ParticipantRegistry, TurnScheduler};
    use crate::testing::{EchoRuntime, MockStore, RecordingSink};
    use async_trait::async_trait;
    use council_domain::{AgentId, DomainEvent, Participant, ParticipantRole};
    use std::sync::atomic::Ordering;

    struct Fixture {
        scheduler: Arc<TurnScheduler>,
        controller: Arc<RunController>,
        sink: Arc<RecordingSink>,
        store: Arc<MockStore>,
    }

    fn fixture() -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        Fixture {
            scheduler: Arc::new(TurnScheduler::new(Arc::new(ParticipantRegistry::new()))),
            controller: Arc::new(RunController::new(sink.clone())),
            store: Arc::new(MockStore::default().with_meeting(
                "m1",
                vec![
                    Participant::new("moderator", "m1", ParticipantRole::Moderator),
                    Participant::new("expert1", "m1", ParticipantRole::Expert),
                    Participant::new("expert2", "m1", ParticipantRole::Expert),
                ],
            )),
            sink,
        }
    }

    impl Fixture {
        fn session(&self, runtime: Arc<dyn AgentRuntime>, params: SessionParams) -> RunSessionUseCase {
            RunSessionUseCase::new(
                StartMeetingUseCase::new(
                    self.store.clone(),
                    Arc::clone(&self.scheduler),
                    Arc::clone(&self.controller),
                    self.sink.clone(),
                ),
                RunTurnUseCase::new(
                    runtime,
                    Arc::clone(&self.scheduler),
                    Arc::clone(&self.controller),
                    self.sink.clone(),
                ),
                ControlMeetingUseCase::new(
                    self.store.clone(),
                    Arc::clone(&self.scheduler),
                    Arc::clone(&self.controller),
                    self.sink.clone(),
                ),
                Arc::clone(&self.controller),
                params,
            )
        }

        fn messages(&self) -> Vec<String> {
            self.sink
                .events()
                .into_iter()
                .filter_map(|e| match e {
                    DomainEvent::AgentMessage(m) => Some(m.agent_id.to_string()),
                    _ => None,
                })
                .collect()
        }
    }

    fn m1() -> MeetingId {
        MeetingId::new("m1")
    }

    #[tokio::test]
    async fn test_session_runs_configured_rounds_then_stops() {
        let f = fixture();
        let session = f.session(
            Arc::new(EchoRuntime::default()),
            SessionParams::default().with_rounds(2),
        );

        let summary = session
            .execute(&m1(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.end, SessionEnd::RoundsCompleted);
        assert_eq!(summary.turns, 6);
        assert_eq!(
            f.messages(),
            vec!["moderator", "expert1", "expert2", "moderator", "expert1", "expert2"]
        );
        assert_eq!(f.controller.state(&m1()).await, RunState::Stopped);
    }

    #[tokio::test]
    async fn test_cancelled_session_stops_run() {
        let f = fixture();
        let session = f.session(Arc::new(EchoRuntime::default()), SessionParams::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = session.execute(&m1(), cancel).await.unwrap();
        assert_eq!(summary.end, SessionEnd::Cancelled);
        assert_eq!(summary.turns, 0);
        assert_eq!(f.controller.state(&m1()).await, RunState::Stopped);
    }

    #[tokio::test]
    async fn test_repeated_agent_failures_end_session() {
        let f = fixture();
        let runtime = Arc::new(EchoRuntime::default());
        runtime.fail.store(true, Ordering::SeqCst);
        let session = f.session(runtime, SessionParams::default());

        let err = session
            .execute(&m1(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CouncilError::AgentRuntime(_)));
        assert_eq!(f.controller.state(&m1()).await, RunState::Stopped);
    }

    /// Runtime that stops the meeting on its first turn
    struct StoppingRuntime {
        controller: Arc<RunController>,
    }

    #[async_trait]
    impl AgentRuntime for StoppingRuntime {
        async fn invoke_agent(
            &self,
            _agent_id: &AgentId,
            context: &TurnContext,
        ) -> Result<String, AgentRuntimeError> {
            self.controller.stop_run(&context.meeting_id).await;
            Ok("goodbye".into())
        }
    }

    #[tokio::test]
    async fn test_external_stop_ends_session() {
        let f = fixture();
        let runtime = Arc::new(StoppingRuntime {
            controller: Arc::clone(&f.controller),
        });
        let session = f.session(runtime, SessionParams::default().with_rounds(5));

        let summary = session
            .execute(&m1(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.end, SessionEnd::StoppedExternally);
        assert_eq!(summary.turns, 0);
        assert!(f.messages().is_empty());
    }
}
