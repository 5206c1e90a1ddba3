//! CLI command definitions and argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use custos_domain::JobStatus;

/// Custos CLI - Capture meeting context and run the ingestion pipeline.
#[derive(Debug, Parser)]
#[command(name = "custos")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CUSTOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path (overrides the configuration file and CUSTOS_DB_PATH)
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a capture for ingestion
    Submit(SubmitArgs),

    /// Show a job's status
    Status(JobArgs),

    /// Force a job back into the queue
    Retry(JobArgs),

    /// Run worker cycles in the foreground and exit
    RunOnce(RunOnceArgs),

    /// Run the worker loop until Ctrl+C
    Work,

    /// List ingestion jobs
    Jobs(JobsArgs),

    /// Collapse duplicate jobs and commitments
    Dedupe,

    /// Repair jobs whose source record is missing
    Repair,

    /// Show pipeline health
    Health,

    /// Show the audit trail
    Audit(AuditArgs),

    /// Manage meetings
    Meeting(MeetingArgs),

    /// Manage people
    Person(PersonArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the submit command.
#[derive(Debug, Parser)]
pub struct SubmitArgs {
    /// Meeting the capture belongs to
    pub meeting: String,

    /// Capture kind (notes, transcript, decision, follow-up, reflection)
    pub kind: String,

    /// Payload text (read from --file or stdin when omitted)
    pub payload: Option<String>,

    /// Read the payload from a file
    #[arg(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,

    /// Referenced person (repeatable)
    #[arg(short, long = "person")]
    pub people: Vec<String>,

    /// Future-relevance timestamp (seconds since epoch)
    #[arg(long)]
    pub relevant_at: Option<u64>,

    /// Due date for extracted commitments (seconds since epoch)
    #[arg(long)]
    pub due_by: Option<u64>,

    /// Submit the payload to semantic memory
    #[arg(long, conflicts_with = "no_index")]
    pub index: bool,

    /// Keep the payload out of semantic memory
    #[arg(long)]
    pub no_index: bool,
}

impl SubmitArgs {
    /// Explicit index override, if either flag was given
    pub fn index_override(&self) -> Option<bool> {
        match (self.index, self.no_index) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Arguments naming a single job.
#[derive(Debug, Parser)]
pub struct JobArgs {
    /// Job ID
    pub job_id: String,
}

/// Arguments for the run-once command.
#[derive(Debug, Parser)]
pub struct RunOnceArgs {
    /// Keep cycling until a cycle finds the queue empty
    #[arg(long)]
    pub drain: bool,
}

/// Arguments for the jobs command.
#[derive(Debug, Parser)]
pub struct JobsArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the audit command.
#[derive(Debug, Parser)]
pub struct AuditArgs {
    /// Only entries for this entity ID
    #[arg(short, long)]
    pub entity: Option<String>,
}

/// Arguments for meeting management.
#[derive(Debug, Parser)]
pub struct MeetingArgs {
    #[command(subcommand)]
    pub action: MeetingAction,
}

/// Meeting management actions.
#[derive(Debug, Subcommand)]
pub enum MeetingAction {
    /// Create or rename a meeting
    Add {
        /// Meeting ID
        id: String,
        /// Meeting title
        title: String,
    },
}

/// Arguments for person management.
#[derive(Debug, Parser)]
pub struct PersonArgs {
    #[command(subcommand)]
    pub action: PersonAction,
}

/// Person management actions.
#[derive(Debug, Subcommand)]
pub enum PersonAction {
    /// Create or rename a person
    Add {
        /// Person ID
        id: String,
        /// Display name
        name: String,
    },

    /// Show a person
    Show {
        /// Person ID
        id: String,
    },
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Job status argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusArg {
    /// Waiting to be claimed
    Queued,
    /// Claimed by the worker
    Running,
    /// Finished, including deduped jobs
    Succeeded,
    /// Failed, waiting for retry
    Failed,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<StatusArg> for JobStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Queued => JobStatus::Queued,
            StatusArg::Running => JobStatus::Running,
            StatusArg::Succeeded => JobStatus::Succeeded,
            StatusArg::Failed => JobStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_command() {
        let cli = Cli::parse_from([
            "custos",
            "submit",
            "m_1",
            "notes",
            "Plan next steps",
            "-p",
            "p_1",
            "--person",
            "p_2",
            "--due-by",
            "9000",
        ]);
        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.meeting, "m_1");
                assert_eq!(args.payload.as_deref(), Some("Plan next steps"));
                assert_eq!(args.people, vec!["p_1", "p_2"]);
                assert_eq!(args.due_by, Some(9_000));
                assert_eq!(args.index_override(), None);
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_index_flags_conflict() {
        let result = Cli::try_parse_from(["custos", "submit", "m_1", "notes", "x", "--index", "--no-index"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_index_override() {
        let cli = Cli::parse_from(["custos", "submit", "m_1", "reflection", "x", "--no-index"]);
        match cli.command {
            Command::Submit(args) => assert_eq!(args.index_override(), Some(false)),
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_jobs_command_defaults() {
        let cli = Cli::parse_from(["custos", "jobs", "--status", "failed"]);
        match cli.command {
            Command::Jobs(args) => {
                assert_eq!(args.limit, 20);
                assert!(matches!(args.status, Some(StatusArg::Failed)));
            }
            _ => panic!("Expected Jobs command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["custos", "health", "--format", "json", "--database", "x.db"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.database.as_deref(), Some("x.db"));
    }

    #[test]
    fn test_status_conversion() {
        let status: JobStatus = StatusArg::Succeeded.into();
        assert_eq!(status, JobStatus::Succeeded);
    }
}
