//! Output formatter trait

use council_application::{ControlOutcome, MeetingStatus, SessionSummary};

/// Trait for rendering what an observer sees
pub trait OutputFormatter: Send + Sync {
    /// Render one delivered wire frame; `None` to print nothing.
    fn format_frame(&self, frame: &str) -> Option<String>;

    /// Render the outcome of a control command
    fn format_control(&self, outcome: &ControlOutcome) -> String;

    /// Render a meeting status snapshot
    fn format_status(&self, status: &MeetingStatus) -> String;

    /// Render the end of a session
    fn format_summary(&self, summary: &SessionSummary) -> String;
}
