//! Run domain.
//!
//! - [`entities::Run`]: one execution of a meeting, with its [`entities::RunState`]
//! - [`control::ControlAction`]: client control actions
//! - [`control::Directive`]: advisory requests for the agent runtime

pub mod control;
pub mod entities;
