//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application and domain
//! types once validated.

use council_application::{BrokerParams, CouncilConfig, SessionParams};
use council_domain::{MeetingId, OutputFormat, Participant, ParticipantRole};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("meeting.id cannot be empty")]
    EmptyMeetingId,

    #[error("meeting.rounds must be at least 1")]
    ZeroRounds,

    #[error("meeting.agent_timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("broker.idle_wait_ms cannot be 0")]
    InvalidIdleWait,

    #[error("meeting has no participants")]
    NoParticipants,

    #[error("participant agent_id cannot be empty")]
    EmptyAgentId,

    #[error("participant {agent_id} has unknown role '{role}'")]
    InvalidRole { agent_id: String, role: String },

    #[error("participant {0} is listed more than once")]
    DuplicateAgent(String),
}

/// Raw broker configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBrokerConfig {
    /// How long the consumer waits on an empty queue before re-checking
    /// for shutdown, in milliseconds
    pub idle_wait_ms: u64,
}

impl Default for FileBrokerConfig {
    fn default() -> Self {
        Self { idle_wait_ms: 1000 }
    }
}

/// One `[[meeting.participants]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileParticipant {
    /// moderator, expert, scribe, integrator or observer
    pub role: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl FileParticipant {
    pub fn new(role: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            agent_id: agent_id.into(),
            name: None,
            model: None,
        }
    }

    /// Convert into a domain participant seated in `meeting_id`.
    pub fn to_participant(
        &self,
        meeting_id: &MeetingId,
    ) -> Result<Participant, ConfigValidationError> {
        let agent_id = self.agent_id.trim();
        if agent_id.is_empty() {
            return Err(ConfigValidationError::EmptyAgentId);
        }
        let role: ParticipantRole =
            self.role
                .parse()
                .map_err(|_| ConfigValidationError::InvalidRole {
                    agent_id: agent_id.to_string(),
                    role: self.role.clone(),
                })?;

        let mut participant = Participant::new(agent_id, meeting_id.clone(), role);
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            participant = participant.with_name(name);
        }
        if let Some(model) = &self.model {
            participant = participant.with_model(model);
        }
        Ok(participant)
    }
}

/// Raw meeting configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMeetingConfig {
    /// Meeting to run
    pub id: String,
    /// Topic handed to every agent turn
    pub topic: Option<String>,
    /// Full rotations before the session stops
    pub rounds: u32,
    /// Pause between turns, in milliseconds
    pub turn_delay_ms: u64,
    /// Agent invocation timeout in seconds (None for no limit)
    pub agent_timeout_secs: Option<u64>,
    /// Seats of the meeting
    pub participants: Vec<FileParticipant>,
}

impl Default for FileMeetingConfig {
    fn default() -> Self {
        Self {
            id: "council".to_string(),
            topic: None,
            rounds: 1,
            turn_delay_ms: 0,
            agent_timeout_secs: Some(120),
            participants: vec![
                FileParticipant::new("moderator", "moderator"),
                FileParticipant::new("expert", "expert1"),
                FileParticipant::new("expert", "expert2"),
            ],
        }
    }
}

/// Raw event journal configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJournalConfig {
    /// JSONL file every delivered wire event is appended to
    pub path: Option<PathBuf>,
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily rolling log files
    pub directory: Option<PathBuf>,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format (uses domain type)
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Complete configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Event broker settings
    pub broker: FileBrokerConfig,
    /// Meeting and session settings
    pub meeting: FileMeetingConfig,
    /// Event journal settings
    pub journal: FileJournalConfig,
    /// Log file settings
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.meeting.id.trim().is_empty() {
            return Err(ConfigValidationError::EmptyMeetingId);
        }
        if self.meeting.rounds == 0 {
            return Err(ConfigValidationError::ZeroRounds);
        }
        if let Some(0) = self.meeting.agent_timeout_secs {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.broker.idle_wait_ms == 0 {
            return Err(ConfigValidationError::InvalidIdleWait);
        }

        self.participants().map(|_| ())
    }

    pub fn meeting_id(&self) -> MeetingId {
        MeetingId::new(self.meeting.id.trim())
    }

    /// Domain participants of the configured meeting.
    pub fn participants(&self) -> Result<Vec<Participant>, ConfigValidationError> {
        if self.meeting.participants.is_empty() {
            return Err(ConfigValidationError::NoParticipants);
        }

        let meeting_id = self.meeting_id();
        let mut seen = HashSet::new();
        self.meeting
            .participants
            .iter()
            .map(|entry| {
                let participant = entry.to_participant(&meeting_id)?;
                if !seen.insert(participant.agent_id.clone()) {
                    return Err(ConfigValidationError::DuplicateAgent(
                        participant.agent_id.to_string(),
                    ));
                }
                Ok(participant)
            })
            .collect()
    }

    /// Application-level configuration derived from this file.
    pub fn to_council_config(&self) -> CouncilConfig {
        let broker =
            BrokerParams::default().with_idle_wait(Duration::from_millis(self.broker.idle_wait_ms));
        let session = SessionParams::default()
            .with_rounds(self.meeting.rounds)
            .with_turn_delay(Duration::from_millis(self.meeting.turn_delay_ms))
            .with_agent_timeout(self.meeting.agent_timeout_secs.map(Duration::from_secs));
        CouncilConfig::new(broker, session)
    }
}
