//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for observed events
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human readable lines
    Pretty,
    /// Raw wire frames, one JSON object per line
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Pretty => council_domain::OutputFormat::Pretty,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// A `role:agent_id[:name]` participant given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantArg {
    pub role: String,
    pub agent_id: String,
    pub name: Option<String>,
}

impl std::str::FromStr for ParticipantArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':').map(str::trim);
        let role = parts.next().filter(|r| !r.is_empty());
        let agent_id = parts.next().filter(|a| !a.is_empty());
        match (role, agent_id) {
            (Some(role), Some(agent_id)) => Ok(Self {
                role: role.to_string(),
                agent_id: agent_id.to_string(),
                name: parts
                    .next()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(format!(
                "expected role:agent_id[:name], got '{s}'"
            )),
        }
    }
}

/// CLI arguments for council
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about = "Agent council - run a meeting of AI agents and watch it live")]
#[command(long_about = r#"
Council runs a meeting of AI agents: it seats the participants, hands the
floor around in a fixed speaking order and streams every event of the run
to observers.

While the meeting runs, type a control command on stdin:
  pause | resume | stop | handoff | request_alt | request_risk | status | help

Configuration files are loaded from (in priority order):
1. --config <path>                  Explicit config file
2. ./council.toml                   Project-level config
3. ~/.config/council/config.toml    Global config
4. COUNCIL_<SECTION>__<KEY>         Environment variables

Example:
  council --topic "Q3 release plan" --rounds 2
  council -p moderator:chair:Chair -p expert:security -p scribe:notes
  council --output json > events.jsonl
"#)]
pub struct Cli {
    /// Meeting to run
    #[arg(short, long, value_name = "ID")]
    pub meeting: Option<String>,

    /// Topic handed to the agents
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Number of full speaking rounds
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Participants as role:agent_id[:name] (can be specified multiple times)
    #[arg(short, long = "participant", value_name = "ROLE:AGENT[:NAME]")]
    pub participants: Vec<ParticipantArg>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode: no control console and no closing summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
