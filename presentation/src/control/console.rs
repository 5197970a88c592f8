//! Line-based control console
//!
//! Reads one command per line (`pause`, `resume`, `stop`, `handoff`,
//! `request_alt`, `request_risk`, `status`, `help`) and applies it to the
//! running meeting. Responses go to stderr so that stdout carries only the
//! observed event stream.

use crate::output::formatter::OutputFormatter;
use council_application::{ControlMeetingUseCase, MeetingStatusUseCase};
use council_domain::MeetingId;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const HELP: &str = "Commands: pause | resume | stop | handoff | request_alt | request_risk | status | help";

/// Reads control commands and applies them to one meeting
pub struct ControlConsole {
    meeting_id: MeetingId,
    control: ControlMeetingUseCase,
    status: MeetingStatusUseCase,
    formatter: Arc<dyn OutputFormatter>,
}

impl ControlConsole {
    pub fn new(
        meeting_id: MeetingId,
        control: ControlMeetingUseCase,
        status: MeetingStatusUseCase,
        formatter: Arc<dyn OutputFormatter>,
    ) -> Self {
        Self {
            meeting_id,
            control,
            status,
            formatter,
        }
    }

    /// Process command lines until the input ends or `cancel` fires.
    pub async fn run(&self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) {
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.recv() => line,
            };
            let Some(line) = line else {
                debug!("Control input closed");
                break;
            };
            if let Some(response) = self.handle_line(&line).await {
                eprintln!("{}", response);
            }
        }
    }

    /// Apply one command line and render the response.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let command = line.trim();
        match command {
            "" => None,
            "help" | "?" => Some(HELP.to_string()),
            "status" => {
                let status = self.status.execute(&self.meeting_id).await;
                Some(self.formatter.format_status(&status))
            }
            action => match self.control.execute_named(&self.meeting_id, action).await {
                Ok(outcome) => Some(self.formatter.format_control(&outcome)),
                Err(e) if e.is_client_error() => Some(format!("{} ({})", e, HELP)),
                Err(e) => Some(format!("Error: {}", e)),
            },
        }
    }
}

/// Read stdin lines on a dedicated thread.
///
/// A blocking stdin read cannot be cancelled, so it must not live on the
/// runtime: the thread is simply abandoned when the process exits.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::json::JsonFormatter;
    use async_trait::async_trait;
    use council_application::{
        CouncilConfig, CouncilServices, MeetingStore, NoEventJournal, StartMeetingUseCase,
        StoreError,
    };
    use council_domain::{Participant, ParticipantRole, Run};

    struct FixedStore;

    #[async_trait]
    impl MeetingStore for FixedStore {
        async fn load_participants(
            &self,
            meeting_id: &MeetingId,
        ) -> Result<Vec<Participant>, StoreError> {
            Ok(vec![
                Participant::new("moderator", meeting_id.clone(), ParticipantRole::Moderator),
                Participant::new("expert1", meeting_id.clone(), ParticipantRole::Expert),
            ])
        }

        async fn save_run(&self, _run: &Run) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn console(services: &CouncilServices) -> ControlConsole {
        let store: Arc<dyn MeetingStore> = Arc::new(FixedStore);
        ControlConsole::new(
            MeetingId::new("m1"),
            ControlMeetingUseCase::from_services(store, services),
            MeetingStatusUseCase::from_services(services),
            Arc::new(JsonFormatter),
        )
    }

    fn json(line: Option<String>) -> serde_json::Value {
        serde_json::from_str(&line.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_blank_line_is_ignored() {
        let services = CouncilServices::new(&CouncilConfig::default(), Arc::new(NoEventJournal));
        assert!(console(&services).handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_command_shows_help() {
        let services = CouncilServices::new(&CouncilConfig::default(), Arc::new(NoEventJournal));
        let response = console(&services).handle_line("restart").await.unwrap();
        assert!(response.contains("Commands:"));
    }

    #[tokio::test]
    async fn test_actions_apply_to_meeting() {
        let services = CouncilServices::new(&CouncilConfig::default(), Arc::new(NoEventJournal));
        let console = console(&services);

        let idle = json(console.handle_line("pause").await);
        assert_eq!(idle["accepted"], false);
        assert_eq!(idle["state"], "idle");

        StartMeetingUseCase::from_services(Arc::new(FixedStore), &services)
            .execute(&MeetingId::new("m1"))
            .await
            .unwrap();

        let handoff = json(console.handle_line("handoff").await);
        assert_eq!(handoff["accepted"], true);
        assert_eq!(handoff["order"]["current_speaker"], "expert1");

        let status = json(console.handle_line("status").await);
        assert_eq!(status["run"]["state"], "running");
        assert_eq!(status["participants"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let services = CouncilServices::new(&CouncilConfig::default(), Arc::new(NoEventJournal));
        let (tx, rx) = mpsc::channel(4);
        tx.send("help".to_string()).await.unwrap();
        tx.send("status".to_string()).await.unwrap();
        drop(tx);

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            console(&services).run(rx, CancellationToken::new()),
        )
        .await
        .unwrap();
    }
}
