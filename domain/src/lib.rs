//! Domain layer for council
//!
//! This crate contains the entities, value objects and pure rules of meeting
//! orchestration. It has no dependencies on runtime, transport or storage
//! concerns.
//!
//! # Core Concepts
//!
//! ## Run
//!
//! A run is one execution of a meeting's council. Its lifecycle is a small
//! state machine (`Idle → Running ⇄ Paused → Stopped`) and `Stopped` is terminal.
//!
//! ## Speaking order
//!
//! The deterministic rotation of turns over a meeting's participants, sorted
//! by role priority and agent id.
//!
//! ## Events
//!
//! Producers report [`DomainEvent`]s; observers receive [`WireEvent`]s. The
//! mapping between the two is a single exhaustive `match`.

pub mod config;
pub mod core;
pub mod event;
pub mod participant;
pub mod run;

// Re-export commonly used types
pub use config::OutputFormat;
pub use core::{
    error::{DomainError, ErrorKind},
    ids::{AgentId, ConnectionId, MeetingId, RunId},
};
pub use event::{
    domain_event::{
        AgentMessage, ArtifactCreated, ArtifactKind, DomainEvent, MessageRole,
        ParticipantStatusChanged, RunStatusChanged, ToolCallStatus, ToolExecution, ToolProgress,
        UnrecognizedEvent,
    },
    wire::WireEvent,
};
pub use participant::{
    entities::{Participant, ParticipantRole, ParticipantStatus, StatusChange, ToolBadge},
    speaking_order::{SpeakingOrder, SpeakingOrderSnapshot},
};
pub use run::{
    control::{ControlAction, Directive, DirectiveKind},
    entities::{Run, RunState, RunStatusKind, RunTransition},
};
