//! CLI entrypoint for council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use council_application::{
    ControlMeetingUseCase, CouncilServices, EventJournal, MeetingStatusUseCase, NoEventJournal,
    RunSessionUseCase, RunTurnUseCase, StartMeetingUseCase,
};
use council_domain::{ConnectionId, OutputFormat};
use council_infrastructure::{
    ChannelConnection, ConfigLoader, DEFAULT_QUEUE_CAPACITY, FileConfig, FileParticipant,
    InMemoryMeetingStore, JsonlEventJournal, ScriptedAgentRuntime,
};
use council_presentation::{
    Cli, ConsoleFormatter, ControlConsole, JsonFormatter, OutputFormatter, stdin_lines,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// How long queued events may take to reach observers before exit.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection id of the terminal observer
const OBSERVER_ID: &str = "cli-observer";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };
    apply_cli_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, &config)?;
    info!("Starting council");

    let meeting_id = config.meeting_id();
    let participants = config.participants()?;
    let council_config = config.to_council_config();

    // === Dependency Injection ===
    let journal: Arc<dyn EventJournal> = match &config.journal.path {
        Some(path) => match JsonlEventJournal::new(path) {
            Some(journal) => {
                info!(path = %journal.path().display(), "Journaling events");
                Arc::new(journal)
            }
            None => Arc::new(NoEventJournal),
        },
        None => Arc::new(NoEventJournal),
    };
    let services = CouncilServices::new(&council_config, journal);
    services.start().await;

    let store = Arc::new(InMemoryMeetingStore::new().with_meeting(meeting_id.clone(), participants));
    let runtime = Arc::new(ScriptedAgentRuntime::new());

    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    if !config.output.color {
        colored::control::set_override(false);
    }
    let formatter: Arc<dyn OutputFormatter> = match format {
        OutputFormat::Pretty => Arc::new(ConsoleFormatter),
        OutputFormat::Json => Arc::new(JsonFormatter),
    };

    // Terminal observer
    let (observer, mut frames) = ChannelConnection::new(OBSERVER_ID, DEFAULT_QUEUE_CAPACITY);
    services
        .rooms
        .connect(Arc::new(observer), &meeting_id)
        .await
        .context("Failed to attach terminal observer")?;
    let printer = tokio::spawn({
        let formatter = Arc::clone(&formatter);
        async move {
            while let Some(frame) = frames.recv().await {
                if let Some(line) = formatter.format_frame(&frame) {
                    println!("{}", line);
                }
            }
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, stopping meeting");
                cancel.cancel();
            }
        }
    });

    // Control commands from stdin
    let console = if cli.quiet {
        None
    } else {
        let console = ControlConsole::new(
            meeting_id.clone(),
            ControlMeetingUseCase::from_services(store.clone(), &services),
            MeetingStatusUseCase::from_services(&services),
            Arc::clone(&formatter),
        );
        let cancel = cancel.child_token();
        Some(tokio::spawn(async move {
            console.run(stdin_lines(), cancel).await;
        }))
    };

    // === Run the meeting ===
    let session_params = council_config.session().clone();
    let mut turn = RunTurnUseCase::from_services(runtime, &services)
        .with_session_params(&session_params);
    if let Some(topic) = &config.meeting.topic {
        turn = turn.with_topic(topic.clone());
    }
    let session = RunSessionUseCase::new(
        StartMeetingUseCase::from_services(store.clone(), &services),
        turn,
        ControlMeetingUseCase::from_services(store.clone(), &services),
        Arc::clone(&services.controller),
        session_params,
    );
    let result = session.execute(&meeting_id, cancel.clone()).await;

    // === Shutdown ===
    cancel.cancel();
    if !services.broker.flush(FLUSH_TIMEOUT).await {
        warn!(pending = services.broker.pending(), "Some events were not delivered");
    }
    services.shutdown().await;
    services.rooms.disconnect(&ConnectionId::new(OBSERVER_ID)).await;
    let _ = printer.await;
    if let Some(console) = console {
        let _ = console.await;
    }

    let summary = result?;
    if !cli.quiet {
        println!("{}", formatter.format_summary(&summary));
    }
    Ok(())
}

/// Command line flags take precedence over every configuration layer.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(meeting) = &cli.meeting {
        config.meeting.id = meeting.clone();
    }
    if let Some(topic) = &cli.topic {
        config.meeting.topic = Some(topic.clone());
    }
    if let Some(rounds) = cli.rounds {
        config.meeting.rounds = rounds;
    }
    if !cli.participants.is_empty() {
        config.meeting.participants = cli
            .participants
            .iter()
            .map(|p| FileParticipant {
                role: p.role.clone(),
                agent_id: p.agent_id.clone(),
                name: p.name.clone(),
                model: None,
            })
            .collect();
    }
}

/// Initialize logging based on verbosity level, with an optional daily
/// log file when `logging.directory` is configured.
fn init_logging(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create log directory {}", directory.display())
            })?;
            let appender = tracing_appender::rolling::daily(directory, "council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
