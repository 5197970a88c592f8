//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_runtime;
pub mod connection;
pub mod event_journal;
pub mod meeting_store;
