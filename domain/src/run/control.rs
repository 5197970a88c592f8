//! Control actions accepted from clients, and advisory directives.

use crate::core::error::DomainError;
use crate::core::ids::{MeetingId, RunId};
use serde::{Deserialize, Serialize};

/// A control action on a meeting's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
    /// Pass the floor to the next speaker
    Handoff,
    #[serde(rename = "request_alt")]
    RequestAlternatives,
    #[serde(rename = "request_risk")]
    RequestRiskAssessment,
}

impl ControlAction {
    pub const ALL: [ControlAction; 6] = [
        ControlAction::Pause,
        ControlAction::Resume,
        ControlAction::Stop,
        ControlAction::Handoff,
        ControlAction::RequestAlternatives,
        ControlAction::RequestRiskAssessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Stop => "stop",
            ControlAction::Handoff => "handoff",
            ControlAction::RequestAlternatives => "request_alt",
            ControlAction::RequestRiskAssessment => "request_risk",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ControlAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::InvalidAction(s.to_string()))
    }
}

/// Kind of advisory directive for the agent runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Experts should propose more alternatives
    Alternatives,
    /// Experts should assess risks of the options on the table
    RiskAssessment,
}

impl DirectiveKind {
    /// Instruction text appended to the next agent turn.
    pub fn instruction(&self) -> &'static str {
        match self {
            DirectiveKind::Alternatives => {
                "Propose additional alternatives that have not been discussed yet."
            }
            DirectiveKind::RiskAssessment => {
                "Assess the risks of the options under discussion, with impact, probability and mitigation."
            }
        }
    }
}

/// An advisory directive queued for a running run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub kind: DirectiveKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_actions() {
        for action in ControlAction::ALL {
            assert_eq!(action.as_str().parse::<ControlAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_action_is_validation_error() {
        let err = "restart".parse::<ControlAction>().unwrap_err();
        assert_eq!(err, DomainError::InvalidAction("restart".into()));
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_action_serde_matches_wire_names() {
        let json = serde_json::to_string(&ControlAction::RequestAlternatives).unwrap();
        assert_eq!(json, "\"request_alt\"");
        let action: ControlAction = serde_json::from_str("\"request_risk\"").unwrap();
        assert_eq!(action, ControlAction::RequestRiskAssessment);
    }
}
