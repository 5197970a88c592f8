//! JSON lines output

use crate::output::formatter::OutputFormatter;
use council_application::{ControlOutcome, MeetingStatus, SessionSummary};
use serde::Serialize;

/// Passes wire frames through untouched and renders everything else as
/// single-line JSON
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_line<T: Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_frame(&self, frame: &str) -> Option<String> {
        Some(frame.to_string())
    }

    fn format_control(&self, outcome: &ControlOutcome) -> String {
        Self::to_line(outcome)
    }

    fn format_status(&self, status: &MeetingStatus) -> String {
        Self::to_line(status)
    }

    fn format_summary(&self, summary: &SessionSummary) -> String {
        Self::to_line(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::SessionEnd;
    use council_domain::{MeetingId, RunId};

    #[test]
    fn test_frames_pass_through() {
        let frame = r#"{"type":"unknown","payload":{"a":1}}"#;
        assert_eq!(JsonFormatter.format_frame(frame).as_deref(), Some(frame));
    }

    #[test]
    fn test_summary_is_one_line() {
        let line = JsonFormatter.format_summary(&SessionSummary {
            meeting_id: MeetingId::new("m1"),
            run_id: RunId::new("r1"),
            turns: 3,
            end: SessionEnd::RoundsCompleted,
        });
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["end"], "rounds_completed");
        assert_eq!(value["turns"], 3);
    }
}
