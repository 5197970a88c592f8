//! Agent runtime adapters

mod scripted;

pub use scripted::ScriptedAgentRuntime;
