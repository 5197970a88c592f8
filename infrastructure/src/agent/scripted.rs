//! Scripted agent runtime
//!
//! Produces deterministic turn content without calling a model: each role
//! has a stock line, agents can be given their own script, and pending
//! directives are appended as follow-up paragraphs. Useful for demos, dry
//! runs and tests of everything around the agents.

use async_trait::async_trait;
use council_application::{AgentRuntime, AgentRuntimeError, TurnContext};
use council_domain::{AgentId, ParticipantRole};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// [`AgentRuntime`] that replays fixed lines
#[derive(Debug, Default)]
pub struct ScriptedAgentRuntime {
    scripts: HashMap<AgentId, Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedAgentRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give an agent its own lines; round `n` speaks line `n - 1`, wrapping.
    pub fn with_script(mut self, agent_id: impl Into<AgentId>, lines: Vec<String>) -> Self {
        self.scripts.insert(agent_id.into(), lines);
        self
    }

    /// Simulated thinking time per turn.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay).filter(|d| !d.is_zero());
        self
    }

    fn scripted_line(&self, agent_id: &AgentId, round: u32) -> Option<&str> {
        let lines = self.scripts.get(agent_id).filter(|lines| !lines.is_empty())?;
        let index = (round.saturating_sub(1) as usize) % lines.len();
        Some(lines[index].as_str())
    }

    fn stock_line(context: &TurnContext) -> String {
        let topic = context.topic.as_deref().unwrap_or("the agenda");
        match context.role {
            ParticipantRole::Moderator => format!(
                "Round {}: let's focus on {}. Experts, please share your positions.",
                context.round, topic
            ),
            ParticipantRole::Expert => format!(
                "From my side, {} needs a clear owner and a measurable outcome.",
                topic
            ),
            ParticipantRole::Scribe => format!(
                "Noted for round {}: positions on {} are recorded.",
                context.round, topic
            ),
            ParticipantRole::Integrator => {
                format!("I'll turn the agreed points on {} into tasks.", topic)
            }
            ParticipantRole::Observer => "No objections so far.".to_string(),
        }
    }
}

#[async_trait]
impl AgentRuntime for ScriptedAgentRuntime {
    async fn invoke_agent(
        &self,
        agent_id: &AgentId,
        context: &TurnContext,
    ) -> Result<String, AgentRuntimeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut content = match self.scripted_line(agent_id, context.round) {
            Some(line) => line.to_string(),
            None => Self::stock_line(context),
        };
        for instruction in context.instructions() {
            content.push_str("\n\n");
            content.push_str(instruction);
        }

        debug!(
            agent_id = %agent_id,
            round = context.round,
            directives = context.directives.len(),
            "Scripted turn"
        );
        Ok(content)
    }
}
