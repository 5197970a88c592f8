//! Presentation layer for council
//!
//! This crate contains CLI definitions, output formatters and the
//! line-based control console.

pub mod cli;
pub mod control;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat, ParticipantArg};
pub use control::{ControlConsole, stdin_lines};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::json::JsonFormatter;
