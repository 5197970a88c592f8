//! Participant entities

use crate::core::error::DomainError;
use crate::core::ids::{AgentId, MeetingId};
use serde::{Deserialize, Serialize};

/// Role of a participant in the council
///
/// The declaration order is the speaking priority: moderators open each
/// round, observers close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Leads the discussion
    Moderator,
    /// Domain expert
    Expert,
    /// Records decisions
    Scribe,
    /// Turns decisions into tasks
    Integrator,
    /// Human or passive observer
    Observer,
}

impl ParticipantRole {
    /// Speaking priority, lower speaks first.
    pub fn priority(&self) -> u8 {
        match self {
            ParticipantRole::Moderator => 0,
            ParticipantRole::Expert => 1,
            ParticipantRole::Scribe => 2,
            ParticipantRole::Integrator => 3,
            ParticipantRole::Observer => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Moderator => "moderator",
            ParticipantRole::Expert => "expert",
            ParticipantRole::Scribe => "scribe",
            ParticipantRole::Integrator => "integrator",
            ParticipantRole::Observer => "observer",
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipantRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moderator" => Ok(ParticipantRole::Moderator),
            "expert" => Ok(ParticipantRole::Expert),
            "scribe" => Ok(ParticipantRole::Scribe),
            "integrator" => Ok(ParticipantRole::Integrator),
            "observer" | "user" => Ok(ParticipantRole::Observer),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// Turn status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// Holds the floor
    Speaking,
    /// Speaks after the current speaker
    Next,
    /// Waiting for a turn
    #[default]
    Waiting,
    /// Occupied outside the rotation (e.g. running a tool)
    Busy,
    /// Not taking part
    Inactive,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Speaking => "speaking",
            ParticipantStatus::Next => "next",
            ParticipantStatus::Waiting => "waiting",
            ParticipantStatus::Busy => "busy",
            ParticipantStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipantStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speaking" => Ok(ParticipantStatus::Speaking),
            "next" => Ok(ParticipantStatus::Next),
            "waiting" => Ok(ParticipantStatus::Waiting),
            "busy" => Ok(ParticipantStatus::Busy),
            "inactive" => Ok(ParticipantStatus::Inactive),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A tool the participant may invoke, shown as a badge to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolBadge {
    pub tool_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A council participant (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub agent_id: AgentId,
    pub meeting_id: MeetingId,
    pub role: ParticipantRole,
    pub name: String,
    #[serde(default)]
    pub status: ParticipantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_badges: Vec<ToolBadge>,
}

impl Participant {
    /// Create a waiting participant whose display name defaults to its id.
    pub fn new(
        agent_id: impl Into<AgentId>,
        meeting_id: impl Into<MeetingId>,
        role: ParticipantRole,
    ) -> Self {
        let agent_id = agent_id.into();
        Self {
            name: agent_id.to_string(),
            agent_id,
            meeting_id: meeting_id.into(),
            role,
            status: ParticipantStatus::Waiting,
            model: None,
            tool_badges: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tool_badge(mut self, badge: ToolBadge) -> Self {
        self.tool_badges.push(badge);
        self
    }

    /// Key used to order participants in a speaking rotation.
    pub fn order_key(&self) -> (u8, &str) {
        (self.role.priority(), self.agent_id.as_str())
    }
}

/// A participant status transition produced by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub agent_id: AgentId,
    pub role: ParticipantRole,
    pub status: ParticipantStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_priority_follows_declaration_order() {
        let roles = [
            ParticipantRole::Moderator,
            ParticipantRole::Expert,
            ParticipantRole::Scribe,
            ParticipantRole::Integrator,
            ParticipantRole::Observer,
        ];
        for (i, role) in roles.iter().enumerate() {
            assert_eq!(role.priority() as usize, i);
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(
            "Moderator".parse::<ParticipantRole>().unwrap(),
            ParticipantRole::Moderator
        );
        assert_eq!(
            "user".parse::<ParticipantRole>().unwrap(),
            ParticipantRole::Observer
        );
        assert_eq!(
            "chair".parse::<ParticipantRole>(),
            Err(DomainError::InvalidRole("chair".into()))
        );
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&ParticipantStatus::Speaking).unwrap();
        assert_eq!(json, "\"speaking\"");
        let status: ParticipantStatus = serde_json::from_str("\"busy\"").unwrap();
        assert_eq!(status, ParticipantStatus::Busy);
    }

    #[test]
    fn test_new_participant_defaults() {
        let p = Participant::new("expert_1", "m1", ParticipantRole::Expert);
        assert_eq!(p.status, ParticipantStatus::Waiting);
        assert_eq!(p.name, "expert_1");
        assert_eq!(p.order_key(), (1, "expert_1"));
    }
}
