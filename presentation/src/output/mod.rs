//! Output formatting for observed meetings

pub mod console;
pub mod formatter;
pub mod json;
