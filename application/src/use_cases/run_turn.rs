//! Run Turn use case
//!
//! Lets the current speaker of a running meeting take one turn:
//!
//! 1. take pending directives (fails if the run is not running)
//! 2. invoke the agent runtime outside the critical section
//! 3. back inside it, publish the message and pass the floor on
//!
//! If the run was paused or stopped while the agent was speaking, the reply
//! is dropped and the order stays where it was. If a handoff moved the floor
//! meanwhile, the reply is still published but the order is not advanced
//! a second time.

use crate::config::SessionParams;
use crate::error::CouncilError;
use crate::ports::agent_runtime::{AgentRuntime, AgentRuntimeError, TurnContext};
use crate::services::{
    CouncilServices, EventSink, ParticipantRegistry, RunController, TurnScheduler, TurnUpdate,
};
use crate::use_cases::shared::publish_status_changes;
use council_domain::{
    AgentId, AgentMessage, DomainError, MeetingId, RunState, SpeakingOrderSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The agent spoke and the order moved on (unless a handoff already did)
    Spoke {
        agent_id: AgentId,
        message_id: String,
        order: SpeakingOrderSnapshot,
    },
    /// The run left `Running` while the agent was speaking
    Interrupted { agent_id: AgentId, state: RunState },
}

/// Use case for running a single agent turn
pub struct RunTurnUseCase {
    runtime: Arc<dyn AgentRuntime>,
    registry: Arc<ParticipantRegistry>,
    scheduler: Arc<TurnScheduler>,
    controller: Arc<RunController>,
    events: Arc<dyn EventSink>,
    topic: Option<String>,
    agent_timeout: Option<Duration>,
}

impl RunTurnUseCase {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        scheduler: Arc<TurnScheduler>,
        controller: Arc<RunController>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            runtime,
            registry: Arc::clone(scheduler.registry()),
            scheduler,
            controller,
            events,
            topic: None,
            agent_timeout: None,
        }
    }

    pub fn from_services(runtime: Arc<dyn AgentRuntime>, services: &CouncilServices) -> Self {
        Self::new(
            runtime,
            Arc::clone(&services.scheduler),
            Arc::clone(&services.controller),
            services.events(),
        )
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_session_params(mut self, params: &SessionParams) -> Self {
        self.agent_timeout = params.agent_timeout;
        self
    }

    pub async fn execute(&self, meeting_id: &MeetingId) -> Result<TurnOutcome, CouncilError> {
        let (run, directives) = self.controller.begin_turn(meeting_id).await?;

        let order = self
            .scheduler
            .speaking_order(&run.run_id)
            .await
            .ok_or_else(|| DomainError::not_found("speaking order", &run.run_id))?;
        let speaker = order
            .current_speaker
            .clone()
            .ok_or_else(|| DomainError::not_found("speaker", &run.run_id))?;
        let participant = self
            .registry
            .get(meeting_id, &speaker)
            .await
            .ok_or_else(|| DomainError::not_found("participant", &speaker))?;

        let context = TurnContext {
            meeting_id: meeting_id.clone(),
            run_id: run.run_id.clone(),
            agent_id: speaker.clone(),
            role: participant.role,
            round: order.round,
            topic: self.topic.clone(),
            directives: directives.iter().map(|d| d.kind).collect(),
        };

        debug!(meeting_id = %meeting_id, agent_id = %speaker, round = order.round, "Invoking agent");
        let content = match self.invoke(&speaker, &context).await {
            Ok(content) => content,
            Err(e) => {
                warn!(agent_id = %speaker, error = %e, "Agent turn failed");
                self.controller
                    .restore_directives(meeting_id, directives)
                    .await;
                return Err(e.into());
            }
        };

        let scheduler = &self.scheduler;
        let events = self.events.as_ref();
        let run_id = run.run_id.clone();
        let agent_id = speaker.clone();
        let published = self
            .controller
            .with_running(meeting_id, |current| async move {
                if current.run_id != run_id {
                    return Ok::<_, DomainError>(None);
                }
                let message = AgentMessage::new(
                    current.meeting_id.clone(),
                    run_id.clone(),
                    agent_id.clone(),
                    content,
                );
                let message_id = message.message_id.clone();
                events.emit_event(message.into());

                let still_speaking = scheduler
                    .speaking_order(&run_id)
                    .await
                    .and_then(|o| o.current_speaker)
                    .is_some_and(|holder| holder == agent_id);
                let order = if still_speaking {
                    let update: TurnUpdate = scheduler.next_speaker(&run_id).await?;
                    publish_status_changes(events, &current.meeting_id, &update.changes);
                    update.order
                } else {
                    scheduler
                        .speaking_order(&run_id)
                        .await
                        .ok_or_else(|| DomainError::not_found("speaking order", &run_id))?
                };
                Ok::<_, DomainError>(Some((message_id, order)))
            })
            .await;

        match published {
            Ok(Ok(Some((message_id, order)))) => {
                info!(
                    meeting_id = %meeting_id,
                    agent_id = %speaker,
                    next = ?order.current_speaker.as_ref().map(AgentId::as_str),
                    round = order.round,
                    "Turn completed"
                );
                Ok(TurnOutcome::Spoke {
                    agent_id: speaker,
                    message_id,
                    order,
                })
            }
            Ok(Ok(None)) | Err(DomainError::NotRunning { .. }) => {
                let state = self.controller.state(meeting_id).await;
                info!(meeting_id = %meeting_id, agent_id = %speaker, %state, "Turn interrupted, reply dropped");
                Ok(TurnOutcome::Interrupted {
                    agent_id: speaker,
                    state,
                })
            }
            Ok(Err(e)) | Err(e) => Err(e.into()),
        }
    }

    async fn invoke(
        &self,
        agent_id: &AgentId,
        context: &TurnContext,
    ) -> Result<String, AgentRuntimeError> {
        let call = self.runtime.invoke_agent(agent_id, context);
        match self.agent_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(AgentRuntimeError::Timeout(agent_id.to_string()))),
            None => call.await,
        }
    }
}
