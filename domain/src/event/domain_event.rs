//! Domain events: what producers report about a meeting.
//!
//! Producers inside the process build typed variants directly. Producers
//! across a process boundary (tool integrations, agent runtimes) hand over
//! JSON, which [`DomainEvent::from_json`] parses at the edge: known `type`
//! values must be well formed, anything else becomes
//! [`DomainEvent::Unrecognized`] and is still delivered to observers.

use crate::core::error::DomainError;
use crate::core::ids::{AgentId, MeetingId, RunId};
use crate::participant::entities::{ParticipantRole, ParticipantStatus};
use crate::run::entities::RunStatusKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    #[default]
    Assistant,
    Tool,
}

/// Progress state of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Started,
    Running,
    Completed,
    Failed,
}

/// Progress details reported while a tool runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Kind of artifact produced by an integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    DecisionLog,
    ActionItems,
    Summary,
    #[serde(other)]
    Other,
}

static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn generate_message_id() -> String {
    let seq = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("msg_{}_{}", Utc::now().timestamp_millis(), seq)
}

/// An agent spoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub meeting_id: MeetingId,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default = "generate_message_id")]
    pub message_id: String,
    pub agent_id: AgentId,
    #[serde(default)]
    pub role: MessageRole,
    pub content: String,
    #[serde(rename = "timestamp", alias = "created_at", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl AgentMessage {
    pub fn new(
        meeting_id: MeetingId,
        run_id: RunId,
        agent_id: AgentId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            meeting_id,
            run_id: Some(run_id),
            message_id: generate_message_id(),
            agent_id,
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            reply_to: None,
        }
    }

    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

/// A participant's turn status changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantStatusChanged {
    pub meeting_id: MeetingId,
    pub agent_id: AgentId,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub role: Option<ParticipantRole>,
}

/// A tool call started, progressed or finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub meeting_id: MeetingId,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub status: ToolCallStatus,
    pub tool_id: String,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    /// Call arguments with secrets already masked by the producer.
    #[serde(default)]
    pub args_masked: Map<String, Value>,
    #[serde(default)]
    pub progress: ToolProgress,
}

/// An integration produced an external artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCreated {
    pub meeting_id: MeetingId,
    pub artifact_type: ArtifactKind,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "timestamp", alias = "created_at", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A run changed lifecycle state or received a directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatusChanged {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub status: RunStatusKind,
}

/// An event whose `type` no known producer uses
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedEvent {
    pub event_type: String,
    pub meeting_id: MeetingId,
    /// The event exactly as the producer sent it.
    pub raw: Map<String, Value>,
}

/// An event about a meeting, produced inside the system
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AgentMessage(AgentMessage),
    ParticipantStatus(ParticipantStatusChanged),
    ToolExecution(ToolExecution),
    ArtifactCreated(ArtifactCreated),
    RunStatus(RunStatusChanged),
    #[serde(skip_deserializing)]
    Unrecognized(UnrecognizedEvent),
}

impl DomainEvent {
    pub const KNOWN_TYPES: [&'static str; 5] = [
        "agent_message",
        "participant_status",
        "tool_execution",
        "artifact_created",
        "run_status",
    ];

    /// Parse a producer's JSON event.
    ///
    /// Fails with [`DomainError::InvalidEvent`] when the value is not an
    /// object, has no `meeting_id`, or has a known `type` with malformed
    /// fields.
    pub fn from_json(value: Value) -> Result<Self, DomainError> {
        let Value::Object(map) = value else {
            return Err(DomainError::InvalidEvent("event is not a JSON object".into()));
        };

        let meeting_id = match map.get("meeting_id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => MeetingId::new(id),
            _ => return Err(DomainError::InvalidEvent("missing meeting_id".into())),
        };

        let event_type = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        if Self::KNOWN_TYPES.contains(&event_type.as_str()) {
            serde_json::from_value(Value::Object(map))
                .map_err(|e| DomainError::InvalidEvent(format!("{}: {}", event_type, e)))
        } else {
            Ok(DomainEvent::Unrecognized(UnrecognizedEvent {
                event_type,
                meeting_id,
                raw: map,
            }))
        }
    }

    /// Producer type of this event.
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::AgentMessage(_) => "agent_message",
            DomainEvent::ParticipantStatus(_) => "participant_status",
            DomainEvent::ToolExecution(_) => "tool_execution",
            DomainEvent::ArtifactCreated(_) => "artifact_created",
            DomainEvent::RunStatus(_) => "run_status",
            DomainEvent::Unrecognized(e) => &e.event_type,
        }
    }

    /// Meeting this event belongs to, if it names one.
    pub fn meeting_id(&self) -> Option<&MeetingId> {
        let id = match self {
            DomainEvent::AgentMessage(e) => &e.meeting_id,
            DomainEvent::ParticipantStatus(e) => &e.meeting_id,
            DomainEvent::ToolExecution(e) => &e.meeting_id,
            DomainEvent::ArtifactCreated(e) => &e.meeting_id,
            DomainEvent::RunStatus(e) => &e.meeting_id,
            DomainEvent::Unrecognized(e) => &e.meeting_id,
        };
        (!id.is_blank()).then_some(id)
    }

    pub fn run_status(meeting_id: MeetingId, run_id: RunId, status: RunStatusKind) -> Self {
        DomainEvent::RunStatus(RunStatusChanged {
            meeting_id,
            run_id,
            status,
        })
    }

    pub fn participant_status(
        meeting_id: MeetingId,
        agent_id: AgentId,
        role: ParticipantRole,
        status: ParticipantStatus,
    ) -> Self {
        DomainEvent::ParticipantStatus(ParticipantStatusChanged {
            meeting_id,
            agent_id,
            status,
            role: Some(role),
        })
    }
}

impl From<AgentMessage> for DomainEvent {
    fn from(message: AgentMessage) -> Self {
        DomainEvent::AgentMessage(message)
    }
}

impl From<ToolExecution> for DomainEvent {
    fn from(execution: ToolExecution) -> Self {
        DomainEvent::ToolExecution(execution)
    }
}

impl From<ArtifactCreated> for DomainEvent {
    fn from(artifact: ArtifactCreated) -> Self {
        DomainEvent::ArtifactCreated(artifact)
    }
}
