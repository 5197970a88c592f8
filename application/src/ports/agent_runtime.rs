//! Agent runtime port
//!
//! The runtime decides *what* an agent says. The council only decides whose
//! turn it is and hands over a [`TurnContext`].

use async_trait::async_trait;
use council_domain::{AgentId, DirectiveKind, MeetingId, ParticipantRole, RunId};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while invoking an agent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentRuntimeError {
    #[error("Agent runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Agent {agent_id} failed: {message}")]
    Failed { agent_id: String, message: String },

    #[error("Agent {0} timed out")]
    Timeout(String),
}

/// Everything an agent needs to take its turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnContext {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub agent_id: AgentId,
    pub role: ParticipantRole,
    pub round: u32,
    /// Topic under discussion, when the meeting has one
    pub topic: Option<String>,
    /// Directives requested by a client since the previous turn
    pub directives: Vec<DirectiveKind>,
}

impl TurnContext {
    /// Instruction lines for the pending directives, in request order.
    pub fn instructions(&self) -> Vec<&'static str> {
        self.directives.iter().map(|d| d.instruction()).collect()
    }
}

/// Runtime that produces turn content for agents
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Let an agent take its turn and return what it says.
    async fn invoke_agent(
        &self,
        agent_id: &AgentId,
        context: &TurnContext,
    ) -> Result<String, AgentRuntimeError>;
}
