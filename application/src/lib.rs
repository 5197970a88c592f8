//! Application layer for council
//!
//! This crate contains the council services, use cases, port definitions
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod error;
pub mod ports;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{BrokerParams, CouncilConfig, SessionParams};
pub use error::CouncilError;
pub use ports::{
    agent_runtime::{AgentRuntime, AgentRuntimeError, TurnContext},
    connection::{Connection, DeliveryError},
    event_journal::{EventJournal, NoEventJournal},
    meeting_store::{MeetingStore, StoreError},
};
pub use services::{
    CouncilServices, EventBroker, EventSink, ParticipantRegistry, RoomInfo, RoomManager,
    RunController, RunStatusView, TurnScheduler, TurnUpdate,
};
pub use use_cases::control_meeting::{ControlMeetingUseCase, ControlOutcome};
pub use use_cases::meeting_status::{MeetingStatus, MeetingStatusUseCase};
pub use use_cases::run_session::{RunSessionUseCase, SessionEnd, SessionSummary};
pub use use_cases::run_turn::{RunTurnUseCase, TurnOutcome};
pub use use_cases::start_meeting::{StartMeetingOutput, StartMeetingUseCase};
