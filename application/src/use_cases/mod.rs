//! Use cases
//!
//! Application-level operations that orchestrate the council services.

pub mod control_meeting;
pub mod meeting_status;
pub mod run_session;
pub mod run_turn;
pub(crate) mod shared;
pub mod start_meeting;
