//! Infrastructure layer for council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod agent;
pub mod config;
pub mod logging;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use agent::ScriptedAgentRuntime;
pub use config::{
    ConfigLoader, ConfigValidationError, FileBrokerConfig, FileConfig, FileJournalConfig,
    FileLoggingConfig, FileMeetingConfig, FileOutputConfig, FileParticipant,
};
pub use logging::JsonlEventJournal;
pub use store::InMemoryMeetingStore;
pub use transport::{ChannelConnection, DEFAULT_QUEUE_CAPACITY, DEFAULT_SEND_TIMEOUT};
