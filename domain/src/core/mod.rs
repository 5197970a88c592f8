//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: meeting, run, agent and connection identifiers
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
