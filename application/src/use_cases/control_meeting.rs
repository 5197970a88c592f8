//! Control Meeting use case
//!
//! Applies a client control action (`pause`, `resume`, `stop`, `handoff`,
//! `request_alt`, `request_risk`) to a meeting's run.
//!
//! An action that is not valid in the current state is not an error: the
//! outcome reports `accepted: false` and nothing changes. Unknown action
//! names are a validation error.

use crate::error::CouncilError;
use crate::ports::meeting_store::MeetingStore;
use crate::services::{CouncilServices, EventSink, RunController, TurnScheduler, TurnUpdate};
use crate::use_cases::shared::publish_status_changes;
use council_domain::{ControlAction, DomainError, MeetingId, RunState, SpeakingOrderSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a control action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlOutcome {
    pub meeting_id: MeetingId,
    pub action: ControlAction,
    /// Whether the action took effect
    pub accepted: bool,
    /// Run state after the action
    pub state: RunState,
    /// Speaking order after a handoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SpeakingOrderSnapshot>,
}

/// Use case for controlling a meeting's run
pub struct ControlMeetingUseCase {
    store: Arc<dyn MeetingStore>,
    scheduler: Arc<TurnScheduler>,
    controller: Arc<RunController>,
    events: Arc<dyn EventSink>,
}

impl ControlMeetingUseCase {
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

    /// Parse an action name and apply it.
    pub async fn execute_named(
        &self,
        meeting_id: &MeetingId,
        action: &str,
    ) -> Result<ControlOutcome, CouncilError> {
        let action: ControlAction = action.parse()?;
        self.execute(meeting_id, action).await
    }

    pub async fn execute(
        &self,
        meeting_id: &MeetingId,
        action: ControlAction,
    ) -> Result<ControlOutcome, CouncilError> {
        let mut order = None;
        let accepted = match action {
            ControlAction::Pause => self.controller.pause_run(meeting_id).await,
            ControlAction::Resume => self.controller.resume_run(meeting_id).await,
            ControlAction::Stop => self.stop(meeting_id).await,
            ControlAction::Handoff => match self.handoff(meeting_id).await? {
                Some(update) => {
                    order = Some(update.order);
                    true
                }
                None => false,
            },
            ControlAction::RequestAlternatives => {
                self.controller.request_alternatives(meeting_id).await
            }
            ControlAction::RequestRiskAssessment => {
                self.controller.request_risk_assessment(meeting_id).await
            }
        };

        let state = self.controller.state(meeting_id).await;
        info!(meeting_id = %meeting_id, %action, accepted, %state, "Control action");
        Ok(ControlOutcome {
            meeting_id: meeting_id.clone(),
            action,
            accepted,
            state,
            order,
        })
    }

    async fn stop(&self, meeting_id: &MeetingId) -> bool {
        let scheduler = &self.scheduler;
        let events = self.events.as_ref();
        let stopped = self
            .controller
            .stop_run_with(meeting_id, |run| async move {
                let changes = scheduler.release(&run.run_id).await;
                publish_status_changes(events, &run.meeting_id, &changes);
                run
            })
            .await;

        match stopped {
            Some(run) => {
                if let Err(e) = self.store.save_run(&run).await {
                    warn!(run_id = %run.run_id, error = %e, "Failed to persist stopped run");
                }
                true
            }
            None => false,
        }
    }

    /// Advance the speaking order; `None` when the run is not running.
    async fn handoff(&self, meeting_id: &MeetingId) -> Result<Option<TurnUpdate>, CouncilError> {
        let scheduler = &self.scheduler;
        let events = self.events.as_ref();
        let advanced = self
            .controller
            .with_running(meeting_id, |run| async move {
                let update = scheduler.next_speaker(&run.run_id).await?;
                publish_status_changes(events, &run.meeting_id, &update.changes);
                Ok::<TurnUpdate, DomainError>(update)
            })
            .await;

        match advanced {
            Ok(Ok(update)) => Ok(Some(update)),
            Ok(Err(e)) => Err(e.into()),
            Err(DomainError::NotRunning { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
