//! Interactive control of a running meeting

mod console;

pub use console::{ControlConsole, stdin_lines};
