//! Console output formatter for meeting events

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::{ControlOutcome, MeetingStatus, SessionEnd, SessionSummary};
use council_domain::event::wire::{ChatMessagePayload, ToolCallPayload};
use council_domain::{ParticipantStatus, RunStatusKind, WireEvent};
use serde::Serialize;

/// Formats wire events for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a wire event; `None` for updates not worth a line.
    pub fn format_event(event: &WireEvent) -> Option<String> {
        match event {
            WireEvent::ConnectionEstablished(p) => Some(format!(
                "{} {} {}",
                "Connected to meeting".cyan().bold(),
                p.meeting_id.to_string().bold(),
                format!("({} observer(s))", p.participants_count).dimmed()
            )),
            WireEvent::RunStatus(p) => {
                let status = match p.status {
                    RunStatusKind::Started | RunStatusKind::Resumed => {
                        p.status.as_str().green().bold()
                    }
                    RunStatusKind::Paused => p.status.as_str().yellow().bold(),
                    RunStatusKind::Stopped => p.status.as_str().red().bold(),
                    RunStatusKind::AlternativesRequested
                    | RunStatusKind::RiskAssessmentRequested => p.status.as_str().magenta(),
                };
                Some(format!(
                    "{} {} {}",
                    "Run".cyan().bold(),
                    status,
                    format!("[{}]", p.run_id).dimmed()
                ))
            }
            WireEvent::ChatMessage(p) => Some(Self::chat(p)),
            WireEvent::ParticipantUpdated(p) => match p.status {
                ParticipantStatus::Speaking => {
                    Some(format!("  {} {}", p.agent_id.to_string().bold(), "has the floor".dimmed()))
                }
                ParticipantStatus::Busy => {
                    Some(format!("  {} {}", p.agent_id.to_string().bold(), "is busy".dimmed()))
                }
                _ => None,
            },
            WireEvent::ToolCall(p) => Some(Self::tool_call(p)),
            WireEvent::Artifact(p) => {
                let location = p
                    .url
                    .as_deref()
                    .or(p.page_id.as_deref())
                    .unwrap_or("(no link)");
                let mut line = format!(
                    "{} {} {}",
                    "Artifact".blue().bold(),
                    label(&p.kind),
                    location.underline()
                );
                if let Some(summary) = &p.summary {
                    line.push_str(&format!("\n    {}", summary));
                }
                Some(line)
            }
            WireEvent::Unknown(payload) => {
                let kind = payload
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("?");
                Some(format!("{} {}", "Event".dimmed(), kind.dimmed()))
            }
        }
    }

    fn chat(p: &ChatMessagePayload) -> String {
        let mut output = format!(
            "\n{}\n",
            format!("── {} ──", p.agent_id).yellow().bold()
        );
        output.push_str(p.content.trim_end());
        output.push('\n');
        output
    }

    fn tool_call(p: &ToolCallPayload) -> String {
        let agent = p
            .agent_id
            .as_ref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default();
        let mut line = format!(
            "  {} {} {}{}",
            "Tool".blue(),
            p.tool_id.bold(),
            label(&p.status),
            agent
        );
        if let Some(percent) = p.progress.percent {
            line.push_str(&format!(" {}%", percent));
        }
        if let Some(message) = &p.progress.message {
            line.push_str(&format!(" {}", message.dimmed()));
        }
        line
    }

    fn header(title: &str) -> String {
        format!(
            "{}\n{}\n{}",
            "═".repeat(50).blue(),
            title.blue().bold(),
            "═".repeat(50).blue()
        )
    }
}

/// Wire name of a serde enum value
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "?".to_string(),
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_frame(&self, frame: &str) -> Option<String> {
        match serde_json::from_str::<WireEvent>(frame) {
            Ok(event) => Self::format_event(&event),
            Err(_) => Some(frame.dimmed().to_string()),
        }
    }

    fn format_control(&self, outcome: &ControlOutcome) -> String {
        let verdict = if outcome.accepted {
            "accepted".green()
        } else {
            "ignored".yellow()
        };
        let mut line = format!(
            "{} {} {} {}",
            ">".cyan().bold(),
            outcome.action,
            verdict,
            format!("(run is {})", outcome.state).dimmed()
        );
        if let Some(order) = &outcome.order
            && let Some(speaker) = &order.current_speaker
        {
            line.push_str(&format!(" {} {}", "next up:".dimmed(), speaker));
        }
        line
    }

    fn format_status(&self, status: &MeetingStatus) -> String {
        let mut output = Self::header(&format!("Meeting {}", status.run.meeting_id));
        output.push('\n');
        output.push_str(&format!("{} {}", "State:".cyan().bold(), status.run.state));
        if let Some(run_id) = &status.run.run_id {
            output.push_str(&format!(" {}", format!("[{}]", run_id).dimmed()));
        }
        output.push('\n');

        if let Some(order) = &status.speaking_order {
            output.push_str(&format!("{} {}\n", "Round:".cyan().bold(), order.round));
            let order_line: Vec<String> = order
                .order
                .iter()
                .map(|agent| {
                    if order.current_speaker.as_ref() == Some(agent) {
                        format!("*{}*", agent).bold().to_string()
                    } else {
                        agent.to_string()
                    }
                })
                .collect();
            output.push_str(&format!("{} {}\n", "Order:".cyan().bold(), order_line.join(" → ")));
        }

        output.push_str(&format!("{}\n", "Participants:".cyan().bold()));
        for participant in &status.participants {
            output.push_str(&format!(
                "  * {} ({}) {}\n",
                participant.name,
                participant.role,
                participant.status.as_str().dimmed()
            ));
        }

        output.push_str(&format!(
            "{} {}\n",
            "Observers:".cyan().bold(),
            status.room.active_connections
        ));
        if status.run.pending_directives > 0 {
            output.push_str(&format!(
                "{} {}\n",
                "Pending directives:".cyan().bold(),
                status.run.pending_directives
            ));
        }
        output
    }

    fn format_summary(&self, summary: &SessionSummary) -> String {
        let end = match summary.end {
            SessionEnd::RoundsCompleted => "all rounds completed".green(),
            SessionEnd::Cancelled => "cancelled".yellow(),
            SessionEnd::StoppedExternally => "stopped".yellow(),
        };
        format!(
            "\n{}\n{} {} turn(s), {}\n",
            Self::header(&format!("Meeting {} ended", summary.meeting_id)),
            "Result:".cyan().bold(),
            summary.turns,
            end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{AgentId, AgentMessage, DomainEvent, MeetingId, ParticipantRole, RunId};

    #[test]
    fn test_chat_message_shows_agent_and_content() {
        colored::control::set_override(false);
        let event = WireEvent::from(DomainEvent::AgentMessage(AgentMessage::new(
            MeetingId::new("m1"),
            RunId::new("r1"),
            AgentId::new("expert1"),
            "We should ship on Friday.",
        )));
        let text = ConsoleFormatter::format_event(&event).unwrap();
        assert!(text.contains("── expert1 ──"));
        assert!(text.contains("We should ship on Friday."));
    }

    #[test]
    fn test_waiting_updates_are_hidden() {
        let event = WireEvent::from(DomainEvent::participant_status(
            MeetingId::new("m1"),
            AgentId::new("expert1"),
            ParticipantRole::Expert,
            ParticipantStatus::Waiting,
        ));
        assert!(ConsoleFormatter::format_event(&event).is_none());
    }

    #[test]
    fn test_unparseable_frame_is_printed_raw() {
        colored::control::set_override(false);
        let text = ConsoleFormatter.format_frame("not json").unwrap();
        assert_eq!(text, "not json");
    }

    #[test]
    fn test_run_status_line() {
        colored::control::set_override(false);
        let frame = WireEvent::from(DomainEvent::run_status(
            MeetingId::new("m1"),
            RunId::new("r1"),
            RunStatusKind::Paused,
        ))
        .to_frame()
        .unwrap();
        let text = ConsoleFormatter.format_frame(&frame).unwrap();
        assert_eq!(text, "Run paused [r1]");
    }
}
