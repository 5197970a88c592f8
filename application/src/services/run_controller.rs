//! Run controller
//!
//! Owns the lifecycle state of every meeting's run behind one critical
//! section. Every successful transition emits exactly one `run_status`
//! event before the lock is released, so observers see state changes in
//! the order they happened.
//!
//! Lock order across services is always controller, then scheduler, then
//! registry. Closures passed to [`RunController::with_running`],
//! [`RunController::start_run_with`] and [`RunController::stop_run_with`]
//! run inside the critical section and may take the scheduler and registry
//! locks, never the controller's.

use crate::services::event_broker::EventSink;
use chrono::{DateTime, Utc};
use council_domain::{
    Directive, DirectiveKind, DomainError, DomainEvent, MeetingId, Run, RunId, RunState,
    RunStatusKind, RunTransition,
};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Latest run of a meeting and its pending directives
struct MeetingRun {
    run: Run,
    directives: VecDeque<Directive>,
}

/// Point-in-time view of a meeting's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatusView {
    pub meeting_id: MeetingId,
    pub state: RunState,
    pub run_id: Option<RunId>,
    pub started_at: Option<DateTime<Utc>>,
    pub pending_directives: usize,
}

/// Per-meeting run lifecycle service
pub struct RunController {
    runs: Mutex<HashMap<MeetingId, MeetingRun>>,
    events: Arc<dyn EventSink>,
}

impl RunController {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn emit_status(&self, run: &Run, status: RunStatusKind) {
        self.events.emit_event(DomainEvent::run_status(
            run.meeting_id.clone(),
            run.run_id.clone(),
            status,
        ));
    }

    // ==================== Lifecycle ====================

    /// Start a new run of a meeting.
    ///
    /// Fails with `AlreadyRunning` while the meeting has a running or paused
    /// run. A meeting whose last run stopped gets a fresh run id.
    pub async fn start_run(&self, meeting_id: &MeetingId) -> Result<Run, DomainError> {
        self.start_run_with(meeting_id, |_| async { Ok::<(), DomainError>(()) })
            .await
            .map(|(run, ())| run)
    }

    /// Start a new run, then run `on_started` inside the same critical
    /// section, after `run_status: started` is emitted.
    ///
    /// `on_started` is not called when the start is rejected, so a rejected
    /// start changes nothing. If `on_started` fails, the new run is stopped
    /// and the error returned.
    pub async fn start_run_with<F, Fut, T, E>(
        &self,
        meeting_id: &MeetingId,
        on_started: F,
    ) -> Result<(Run, T), E>
    where
        F: FnOnce(Run) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DomainError>,
    {
        let mut runs = self.runs.lock().await;
        if let Some(existing) = runs.get(meeting_id)
            && existing.run.state.is_active()
        {
            return Err(DomainError::AlreadyRunning(meeting_id.to_string()).into());
        }

        let mut run = Run::start(meeting_id.clone(), Utc::now());
        info!(meeting_id = %meeting_id, run_id = %run.run_id, "Run started");
        self.emit_status(&run, RunStatusKind::Started);

        let outcome = on_started(run.clone()).await;
        if outcome.is_err() && run.transition(RunTransition::Stop) {
            warn!(meeting_id = %meeting_id, run_id = %run.run_id, "Run setup failed, stopping run");
            self.emit_status(&run, RunStatusKind::Stopped);
        }
        runs.insert(
            meeting_id.clone(),
            MeetingRun {
                run: run.clone(),
                directives: VecDeque::new(),
            },
        );
        outcome.map(|value| (run, value))
    }

    pub async fn pause_run(&self, meeting_id: &MeetingId) -> bool {
        self.transition(meeting_id, RunTransition::Pause).await
    }

    pub async fn resume_run(&self, meeting_id: &MeetingId) -> bool {
        self.transition(meeting_id, RunTransition::Resume).await
    }

    pub async fn stop_run(&self, meeting_id: &MeetingId) -> bool {
        self.stop_run_with(meeting_id, |_| async {}).await.is_some()
    }

    /// Stop a running or paused run, then run `on_stopped` inside the
    /// critical section.
    ///
    /// Returns `None` without calling `on_stopped` if there was nothing to stop.
    pub async fn stop_run_with<F, Fut, T>(&self, meeting_id: &MeetingId, on_stopped: F) -> Option<T>
    where
        F: FnOnce(Run) -> Fut,
        Fut: Future<Output = T>,
    {
        let mut runs = self.runs.lock().await;
        let entry = runs.get_mut(meeting_id)?;
        if !entry.run.transition(RunTransition::Stop) {
            debug!(meeting_id = %meeting_id, state = %entry.run.state, "Ignored stop");
            return None;
        }
        entry.directives.clear();
        info!(meeting_id = %meeting_id, run_id = %entry.run.run_id, "Run stopped");
        self.emit_status(&entry.run, RunStatusKind::Stopped);
        Some(on_stopped(entry.run.clone()).await)
    }

    async fn transition(&self, meeting_id: &MeetingId, transition: RunTransition) -> bool {
        let mut runs = self.runs.lock().await;
        let Some(entry) = runs.get_mut(meeting_id) else {
            debug!(meeting_id = %meeting_id, ?transition, "No run to transition");
            return false;
        };
        if !entry.run.transition(transition) {
            debug!(meeting_id = %meeting_id, state = %entry.run.state, ?transition, "Ignored transition");
            return false;
        }
        info!(
            meeting_id = %meeting_id,
            run_id = %entry.run.run_id,
            state = %entry.run.state,
            "Run state changed"
        );
        self.emit_status(&entry.run, transition.status());
        true
    }

    // ==================== Directives ====================

    pub async fn request_alternatives(&self, meeting_id: &MeetingId) -> bool {
        self.request(meeting_id, DirectiveKind::Alternatives).await
    }

    pub async fn request_risk_assessment(&self, meeting_id: &MeetingId) -> bool {
        self.request(meeting_id, DirectiveKind::RiskAssessment).await
    }

    async fn request(&self, meeting_id: &MeetingId, kind: DirectiveKind) -> bool {
        let mut runs = self.runs.lock().await;
        let Some(entry) = runs.get_mut(meeting_id) else {
            return false;
        };
        if entry.run.state != RunState::Running {
            return false;
        }

        entry.directives.push_back(Directive {
            meeting_id: meeting_id.clone(),
            run_id: entry.run.run_id.clone(),
            kind,
        });
        let status = match kind {
            DirectiveKind::Alternatives => RunStatusKind::AlternativesRequested,
            DirectiveKind::RiskAssessment => RunStatusKind::RiskAssessmentRequested,
        };
        info!(meeting_id = %meeting_id, directive = ?kind, "Directive queued");
        self.emit_status(&entry.run, status);
        true
    }

    /// Check the run is running and take its pending directives.
    pub async fn begin_turn(
        &self,
        meeting_id: &MeetingId,
    ) -> Result<(Run, Vec<Directive>), DomainError> {
        let mut runs = self.runs.lock().await;
        let entry = running_entry(&mut runs, meeting_id)?;
        let directives = entry.directives.drain(..).collect();
        Ok((entry.run.clone(), directives))
    }

    /// Put directives back at the front of the queue, e.g. after a failed
    /// turn. Ignored if the run they belong to is no longer current.
    pub async fn restore_directives(&self, meeting_id: &MeetingId, directives: Vec<Directive>) {
        let mut runs = self.runs.lock().await;
        let Some(entry) = runs.get_mut(meeting_id) else {
            return;
        };
        for directive in directives.into_iter().rev() {
            if directive.run_id == entry.run.run_id && entry.run.state.is_active() {
                entry.directives.push_front(directive);
            }
        }
    }

    // ==================== Queries ====================

    /// Run `f` inside the critical section, only while the meeting is running.
    ///
    /// Fails with `NotRunning` (and does not call `f`) otherwise. This is how
    /// callers keep a paused run's speaking order frozen.
    pub async fn with_running<F, Fut, T>(&self, meeting_id: &MeetingId, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(Run) -> Fut,
        Fut: Future<Output = T>,
    {
        let mut runs = self.runs.lock().await;
        let run = running_entry(&mut runs, meeting_id)?.run.clone();
        Ok(f(run).await)
    }

    pub async fn current_run(&self, meeting_id: &MeetingId) -> Option<Run> {
        let runs = self.runs.lock().await;
        runs.get(meeting_id).map(|entry| entry.run.clone())
    }

    pub async fn state(&self, meeting_id: &MeetingId) -> RunState {
        let runs = self.runs.lock().await;
        runs.get(meeting_id)
            .map(|entry| entry.run.state)
            .unwrap_or_default()
    }

    pub async fn status(&self, meeting_id: &MeetingId) -> RunStatusView {
        let runs = self.runs.lock().await;
        match runs.get(meeting_id) {
            Some(entry) => RunStatusView {
                meeting_id: meeting_id.clone(),
                state: entry.run.state,
                run_id: Some(entry.run.run_id.clone()),
                started_at: Some(entry.run.started_at),
                pending_directives: entry.directives.len(),
            },
            None => RunStatusView {
                meeting_id: meeting_id.clone(),
                state: RunState::Idle,
                run_id: None,
                started_at: None,
                pending_directives: 0,
            },
        }
    }
}

fn running_entry<'a>(
    runs: &'a mut HashMap<MeetingId, MeetingRun>,
    meeting_id: &MeetingId,
) -> Result<&'a mut MeetingRun, DomainError> {
    match runs.get_mut(meeting_id) {
        Some(entry) if entry.run.state == RunState::Running => Ok(entry),
        _ => Err(DomainError::NotRunning {
            meeting_id: meeting_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use council_domain::ErrorKind;

    fn controller() -> (RunController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (RunController::new(sink.clone()), sink)
    }

    fn m1() -> MeetingId {
        MeetingId::new("m1")
    }

    #[tokio::test]
    async fn test_start_run_twice_is_already_running() {
        let (controller, sink) = controller();
        controller.start_run(&m1()).await.unwrap();

        let err = controller.start_run(&m1()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(controller.state(&m1()).await, RunState::Running);
        assert_eq!(sink.run_statuses(), vec![RunStatusKind::Started]);
    }

    #[tokio::test]
    async fn test_start_run_while_paused_is_already_running() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        assert!(controller.pause_run(&m1()).await);
        assert!(matches!(
            controller.start_run(&m1()).await,
            Err(DomainError::AlreadyRunning(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_start_skips_setup() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();

        let mut called = false;
        let result = controller
            .start_run_with(&m1(), |_| {
                called = true;
                async { Ok::<(), DomainError>(()) }
            })
            .await;
        assert!(matches!(result, Err(DomainError::AlreadyRunning(_))));
        assert!(!called);
    }

    #[tokio::test]
    async fn test_failed_setup_stops_new_run() {
        let (controller, sink) = controller();
        let result = controller
            .start_run_with(&m1(), |run| async move {
                assert_eq!(run.state, RunState::Running);
                Err::<(), DomainError>(DomainError::EmptyParticipantSet)
            })
            .await;

        assert_eq!(result.unwrap_err(), DomainError::EmptyParticipantSet);
        assert_eq!(controller.state(&m1()).await, RunState::Stopped);
        assert_eq!(
            sink.run_statuses(),
            vec![RunStatusKind::Started, RunStatusKind::Stopped]
        );
        controller.start_run(&m1()).await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_resume_on_idle_are_rejected() {
        let (controller, sink) = controller();
        assert!(!controller.pause_run(&m1()).await);
        assert!(!controller.resume_run(&m1()).await);
        assert!(!controller.stop_run(&m1()).await);
        assert_eq!(controller.state(&m1()).await, RunState::Idle);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_full_lifecycle_emits_one_status_per_transition() {
        let (controller, sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        assert!(controller.pause_run(&m1()).await);
        assert!(!controller.pause_run(&m1()).await);
        assert!(controller.resume_run(&m1()).await);
        assert!(controller.stop_run(&m1()).await);
        assert!(!controller.resume_run(&m1()).await);

        assert_eq!(
            sink.run_statuses(),
            vec![
                RunStatusKind::Started,
                RunStatusKind::Paused,
                RunStatusKind::Resumed,
                RunStatusKind::Stopped,
            ]
        );
        assert_eq!(controller.state(&m1()).await, RunState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_from_paused() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        controller.pause_run(&m1()).await;
        assert!(controller.stop_run(&m1()).await);
    }

    #[tokio::test]
    async fn test_new_run_after_stop_gets_fresh_id() {
        let (controller, _sink) = controller();
        let first = controller.start_run(&m1()).await.unwrap();
        controller.stop_run(&m1()).await;

        let second = controller.start_run(&m1()).await.unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(second.state, RunState::Running);
    }

    #[tokio::test]
    async fn test_directives_only_while_running() {
        let (controller, sink) = controller();
        assert!(!controller.request_alternatives(&m1()).await);

        controller.start_run(&m1()).await.unwrap();
        assert!(controller.request_alternatives(&m1()).await);
        assert!(controller.request_risk_assessment(&m1()).await);
        assert_eq!(controller.status(&m1()).await.pending_directives, 2);
        assert_eq!(controller.state(&m1()).await, RunState::Running);

        controller.pause_run(&m1()).await;
        assert!(!controller.request_risk_assessment(&m1()).await);

        assert_eq!(
            sink.run_statuses(),
            vec![
                RunStatusKind::Started,
                RunStatusKind::AlternativesRequested,
                RunStatusKind::RiskAssessmentRequested,
                RunStatusKind::Paused,
            ]
        );
    }

    #[tokio::test]
    async fn test_begin_turn_drains_directives_in_order() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        controller.request_risk_assessment(&m1()).await;
        controller.request_alternatives(&m1()).await;

        let (_, directives) = controller.begin_turn(&m1()).await.unwrap();
        let kinds: Vec<_> = directives.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DirectiveKind::RiskAssessment, DirectiveKind::Alternatives]
        );
        assert_eq!(controller.status(&m1()).await.pending_directives, 0);

        controller.restore_directives(&m1(), directives).await;
        let (_, again) = controller.begin_turn(&m1()).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].kind, DirectiveKind::RiskAssessment);
    }

    #[tokio::test]
    async fn test_with_running_refuses_paused_run() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        assert_eq!(controller.with_running(&m1(), |_| async { 7 }).await, Ok(7));

        controller.pause_run(&m1()).await;
        let err = controller
            .with_running(&m1(), |_| async { 7 })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::NotRunning {
                meeting_id: "m1".into()
            }
        );
        assert!(controller.begin_turn(&m1()).await.is_err());
    }

    #[tokio::test]
    async fn test_status_of_unknown_meeting_is_idle() {
        let (controller, _sink) = controller();
        let status = controller.status(&m1()).await;
        assert_eq!(status.state, RunState::Idle);
        assert_eq!(status.run_id, None);
        assert!(controller.current_run(&m1()).await.is_none());
    }

    #[tokio::test]
    async fn test_meetings_are_independent() {
        let (controller, _sink) = controller();
        controller.start_run(&m1()).await.unwrap();
        controller.start_run(&MeetingId::new("m2")).await.unwrap();
        controller.stop_run(&m1()).await;
        assert_eq!(
            controller.state(&MeetingId::new("m2")).await,
            RunState::Running
        );
    }

    #[tokio::test]
    async fn test_concurrent_starts_admit_exactly_one() {
        let (controller, _sink) = controller();
        let controller = Arc::new(controller);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let controller = Arc::clone(&controller);
            handles.push(tokio::spawn(async move {
                controller.start_run(&MeetingId::new("m1")).await.is_ok()
            }));
        }
        let mut started = 0;
        for handle in handles {
            if handle.await.unwrap() {
                started += 1;
            }
        }
        assert_eq!(started, 1);
    }
}
