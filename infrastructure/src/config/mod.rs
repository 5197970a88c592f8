//! Configuration file loading for council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./council.toml` or `./.council.toml`
//! 3. Global config: `$XDG_CONFIG_HOME/council/config.toml`
//! 4. Environment variables prefixed with `COUNCIL_`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBrokerConfig, FileConfig, FileJournalConfig, FileLoggingConfig,
    FileMeetingConfig, FileOutputConfig, FileParticipant,
};
pub use loader::ConfigLoader;
