//! Wire events: the canonical messages delivered to observers.
//!
//! Every delivered message is one JSON object `{"type": ..., "payload": {...}}`.
//! [`WireEvent::from_domain`] is the only place domain events are mapped to
//! that shape; it is a total, side-effect free `match`.

use crate::core::ids::{AgentId, MeetingId, RunId};
use crate::event::domain_event::{
    ArtifactKind, DomainEvent, MessageRole, ToolCallStatus, ToolProgress,
};
use crate::participant::entities::{ParticipantRole, ParticipantStatus};
use crate::run::entities::RunStatusKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub id: String,
    pub run_id: Option<RunId>,
    pub agent_id: AgentId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantUpdatedPayload {
    pub agent_id: AgentId,
    pub status: ParticipantStatus,
    pub role: Option<ParticipantRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub thread_id: Option<String>,
    pub status: ToolCallStatus,
    pub tool_id: String,
    pub agent_id: Option<AgentId>,
    pub args_masked: Map<String, Value>,
    pub progress: ToolProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPayload {
    pub kind: ArtifactKind,
    pub meeting_id: MeetingId,
    pub page_id: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatusPayload {
    pub run_id: RunId,
    pub status: RunStatusKind,
    pub meeting_id: MeetingId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEstablishedPayload {
    pub meeting_id: MeetingId,
    pub connected_at: DateTime<Utc>,
    /// Number of connections in the room, including the new one.
    pub participants_count: usize,
}

/// A message as delivered to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WireEvent {
    RunStatus(RunStatusPayload),
    ChatMessage(ChatMessagePayload),
    ParticipantUpdated(ParticipantUpdatedPayload),
    ToolCall(ToolCallPayload),
    Artifact(ArtifactPayload),
    /// A producer event of unrecognized type, passed through verbatim.
    Unknown(Map<String, Value>),
    ConnectionEstablished(ConnectionEstablishedPayload),
}

impl WireEvent {
    /// Map a domain event to its wire form.
    pub fn from_domain(event: DomainEvent) -> Self {
        match event {
            DomainEvent::AgentMessage(m) => WireEvent::ChatMessage(ChatMessagePayload {
                id: m.message_id,
                run_id: m.run_id,
                agent_id: m.agent_id,
                role: m.role,
                content: m.content,
                created_at: m.created_at,
                reply_to: m.reply_to,
            }),
            DomainEvent::ParticipantStatus(p) => {
                WireEvent::ParticipantUpdated(ParticipantUpdatedPayload {
                    agent_id: p.agent_id,
                    status: p.status,
                    role: p.role,
                })
            }
            DomainEvent::ToolExecution(t) => WireEvent::ToolCall(ToolCallPayload {
                thread_id: t.thread_id,
                status: t.status,
                tool_id: t.tool_id,
                agent_id: t.agent_id,
                args_masked: t.args_masked,
                progress: t.progress,
            }),
            DomainEvent::ArtifactCreated(a) => WireEvent::Artifact(ArtifactPayload {
                kind: a.artifact_type,
                meeting_id: a.meeting_id,
                page_id: a.external_ref,
                url: a.url,
                summary: a.summary,
                created_at: a.created_at,
            }),
            DomainEvent::RunStatus(r) => WireEvent::RunStatus(RunStatusPayload {
                run_id: r.run_id,
                status: r.status,
                meeting_id: r.meeting_id,
            }),
            DomainEvent::Unrecognized(u) => WireEvent::Unknown(u.raw),
        }
    }

    pub fn connection_established(meeting_id: MeetingId, participants_count: usize) -> Self {
        WireEvent::ConnectionEstablished(ConnectionEstablishedPayload {
            meeting_id,
            connected_at: Utc::now(),
            participants_count,
        })
    }

    /// Wire `type` value.
    pub fn event_type(&self) -> &'static str {
        match self {
            WireEvent::RunStatus(_) => "run_status",
            WireEvent::ChatMessage(_) => "chat_message",
            WireEvent::ParticipantUpdated(_) => "participant_updated",
            WireEvent::ToolCall(_) => "tool_call",
            WireEvent::Artifact(_) => "artifact",
            WireEvent::Unknown(_) => "unknown",
            WireEvent::ConnectionEstablished(_) => "connection_established",
        }
    }

    /// Serialize to a single-line JSON frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<DomainEvent> for WireEvent {
    fn from(event: DomainEvent) -> Self {
        WireEvent::from_domain(event)
    }
}
