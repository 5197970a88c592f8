//! Application-level configuration.
//!
//! - [`BrokerParams`]: event broker loop control
//! - [`SessionParams`]: rounds, pacing and agent timeouts of a session
//! - [`CouncilConfig`]: container handed to the services

pub mod council_config;

pub use council_config::{BrokerParams, CouncilConfig, SessionParams};
