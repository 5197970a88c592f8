//! Run entities and the lifecycle state machine.

use crate::core::ids::{MeetingId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a run
///
/// ```text
/// Idle ──start──▶ Running ◀──resume── Paused
///                  │  └──pause──────────▲
///                  └──stop──▶ Stopped ◀──stop── Paused
/// ```
///
/// `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Stopped => "stopped",
        }
    }

    /// Whether a run in this state still occupies its meeting.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle transition of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunTransition {
    Start,
    Pause,
    Resume,
    Stop,
}

impl RunTransition {
    /// Target state if the transition is legal from `from`.
    pub fn apply(self, from: RunState) -> Option<RunState> {
        match (self, from) {
            (RunTransition::Start, RunState::Idle) => Some(RunState::Running),
            (RunTransition::Pause, RunState::Running) => Some(RunState::Paused),
            (RunTransition::Resume, RunState::Paused) => Some(RunState::Running),
            (RunTransition::Stop, RunState::Running | RunState::Paused) => Some(RunState::Stopped),
            _ => None,
        }
    }

    /// Status reported to observers once the transition succeeded.
    pub fn status(self) -> RunStatusKind {
        match self {
            RunTransition::Start => RunStatusKind::Started,
            RunTransition::Pause => RunStatusKind::Paused,
            RunTransition::Resume => RunStatusKind::Resumed,
            RunTransition::Stop => RunStatusKind::Stopped,
        }
    }
}

/// Status value carried by `run_status` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatusKind {
    Started,
    Paused,
    Resumed,
    Stopped,
    AlternativesRequested,
    RiskAssessmentRequested,
}

impl RunStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatusKind::Started => "started",
            RunStatusKind::Paused => "paused",
            RunStatusKind::Resumed => "resumed",
            RunStatusKind::Stopped => "stopped",
            RunStatusKind::AlternativesRequested => "alternatives_requested",
            RunStatusKind::RiskAssessmentRequested => "risk_assessment_requested",
        }
    }
}

impl std::fmt::Display for RunStatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One execution of a meeting's council (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    pub meeting_id: MeetingId,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
}

impl Run {
    /// Start a new run; the run is `Running` as soon as it exists.
    pub fn start(meeting_id: MeetingId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: RunId::generate(&meeting_id, started_at),
            meeting_id,
            state: RunState::Running,
            started_at,
        }
    }

    /// Apply a transition, returning `false` without change when illegal.
    pub fn transition(&mut self, transition: RunTransition) -> bool {
        match transition.apply(self.state) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            RunTransition::Start.apply(RunState::Idle),
            Some(RunState::Running)
        );
        assert_eq!(
            RunTransition::Pause.apply(RunState::Running),
            Some(RunState::Paused)
        );
        assert_eq!(
            RunTransition::Resume.apply(RunState::Paused),
            Some(RunState::Running)
        );
        assert_eq!(
            RunTransition::Stop.apply(RunState::Paused),
            Some(RunState::Stopped)
        );
    }

    #[test]
    fn test_stopped_is_terminal() {
        for t in [
            RunTransition::Start,
            RunTransition::Pause,
            RunTransition::Resume,
            RunTransition::Stop,
        ] {
            assert_eq!(t.apply(RunState::Stopped), None);
        }
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let mut run = Run::start(MeetingId::new("m1"), Utc::now());
        assert!(!run.transition(RunTransition::Resume));
        assert_eq!(run.state, RunState::Running);
        assert!(run.transition(RunTransition::Pause));
        assert!(!run.transition(RunTransition::Pause));
        assert_eq!(run.state, RunState::Paused);
    }

    #[test]
    fn test_status_kind_strings() {
        assert_eq!(RunTransition::Resume.status().as_str(), "resumed");
        assert_eq!(
            serde_json::to_string(&RunStatusKind::RiskAssessmentRequested).unwrap(),
            "\"risk_assessment_requested\""
        );
    }
}
