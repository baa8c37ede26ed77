//! Clap derive structures for the `sybil` console.
//!
//! Every page of the admin console maps to a top-level noun; its reads
//! and actions are subcommands underneath. Shared flags live in
//! [`GlobalOpts`] and are accepted anywhere on the command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-level ────────────────────────────────────────────────────────

/// sybil: administer the Sybil knowledge platform from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "sybil",
    version,
    about = "Administer the Sybil knowledge platform from the command line",
    long_about = "Chat with the Sybil assistant, manage the SMS whitelist and prompt \
        settings, and monitor the Google Drive and Otter ingestion pipelines.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SYBIL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides the profile)
    #[arg(long, short = 'u', env = "SYBIL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SYBIL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "SYBIL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SYBIL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Config file to use instead of the platform default
    #[arg(long, env = "SYBIL_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the session and chat cache
    #[arg(long, env = "SYBIL_DATA_DIR", global = true, value_name = "DIR", hide = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rounded tables and aligned detail views
    Table,
    /// Pretty-printed JSON
    Json,
    /// Single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// One identifier per line
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when writing to a terminal and NO_COLOR is unset
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in to the backend and store the session
    Login(LoginArgs),

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Talk to the Sybil assistant
    Chat(ChatArgs),

    /// Manage the SMS whitelist
    #[command(alias = "wl")]
    Whitelist(WhitelistArgs),

    /// View and edit the assistant's prompt settings
    Prompt(PromptArgs),

    /// Monitor Google Drive document ingestion
    #[command(alias = "drive")]
    Gdrive(GdriveArgs),

    /// Browse Otter transcripts and their classification
    #[command(alias = "otter")]
    Transcripts(TranscriptsArgs),

    /// Monitor and control the knowledge-graph pipeline
    Pipeline(PipelineArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username or email (defaults to the profile's username)
    #[arg(long)]
    pub username: Option<String>,

    /// Password (prefer the keyring or SYBIL_PASSWORD)
    #[arg(long, env = "SYBIL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── Chat ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[command(subcommand)]
    pub command: ChatCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChatCommand {
    /// Ask one question and print the answer
    Send {
        /// The question to ask
        message: String,
    },

    /// Interactive conversation; an empty line or Ctrl-D ends it
    Repl,

    /// Show the cached conversation
    History {
        /// Only the last N messages
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Forget the cached conversation
    Clear,

    /// Check that the assistant backend is up
    Health,
}

// ── Whitelist ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WhitelistArgs {
    #[command(subcommand)]
    pub command: WhitelistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WhitelistCommand {
    /// List whitelisted numbers
    #[command(alias = "ls")]
    List {
        /// Hide deactivated entries
        #[arg(long)]
        active_only: bool,
    },

    /// Allow a phone number to text the assistant
    Add {
        /// Phone number, e.g. +15551234567
        phone_number: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change an entry's details
    Update {
        id: i64,

        #[arg(long)]
        phone_number: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Set the active flag explicitly
        #[arg(long)]
        active: Option<bool>,
    },

    /// Flip an entry between active and inactive
    Toggle { id: i64 },

    /// Remove an entry (deactivates unless --hard)
    #[command(alias = "rm")]
    Delete {
        id: i64,

        /// Delete the row permanently
        #[arg(long)]
        hard: bool,
    },

    /// Check whether a number is whitelisted and active
    Check { phone_number: String },

    /// Entry counts
    Stats,
}

// ── Prompt ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PromptArgs {
    #[command(subcommand)]
    pub command: PromptCommand,
}

#[derive(Debug, Subcommand)]
pub enum PromptCommand {
    /// Show the current settings
    Show {
        /// Print the instructions the assistant receives instead
        #[arg(long)]
        preview: bool,
    },

    /// Change settings; unset flags keep their current value
    Set(PromptSetArgs),
}

#[derive(Debug, Args)]
pub struct PromptSetArgs {
    /// Replace the whole configuration with a JSON file
    #[arg(long, short = 'F', value_name = "PATH", conflicts_with_all = [
        "tone", "smart_brevity", "people_references", "formatting", "emojis",
        "response_length", "ask_about_depth", "tone_adapts", "custom_instructions",
    ])]
    pub from_file: Option<PathBuf>,

    /// Free-form tone description, e.g. "Calm, confident, and concise"
    #[arg(long)]
    pub tone: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub smart_brevity: Option<bool>,

    /// first_names_internally_roles_cross_team, always_first_names or always_roles
    #[arg(long)]
    pub people_references: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub formatting: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub emojis: Option<bool>,

    /// Default answer length, e.g. "3-6 sentences or short bullet lists"
    #[arg(long)]
    pub response_length: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub ask_about_depth: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub tone_adapts: Option<bool>,

    /// Free-form text appended to the instructions
    #[arg(long)]
    pub custom_instructions: Option<String>,
}

// ── Google Drive ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GdriveArgs {
    #[command(subcommand)]
    pub command: GdriveCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileStatusArg {
    Pending,
    Processing,
    Success,
    Failed,
}

#[derive(Debug, Subcommand)]
pub enum GdriveCommand {
    /// List tracked files
    #[command(alias = "ls")]
    Files {
        #[arg(long, short = 's')]
        status: Option<FileStatusArg>,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// File counts by status
    Stats,

    /// Re-queue a failed file
    Retry {
        /// Google Drive file ID
        file_id: String,
    },

    /// Follow ingestion progress until interrupted
    Watch {
        #[arg(long, short = 's')]
        status: Option<FileStatusArg>,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
}

// ── Transcripts ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TranscriptsArgs {
    #[command(subcommand)]
    pub command: TranscriptsCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Date,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallTypeArg {
    Team,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranscriptStatusArg {
    All,
    Processed,
    Failed,
}

#[derive(Debug, Subcommand)]
pub enum TranscriptsCommand {
    /// List processed and failed transcripts
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "date")]
        sort_by: SortArg,

        #[arg(long, default_value = "desc")]
        order: OrderArg,

        #[arg(long)]
        call_type: Option<CallTypeArg>,

        /// Filter the listing locally by status
        #[arg(long, default_value = "all")]
        status: TranscriptStatusArg,
    },

    /// Transcript counts
    Stats,

    /// Reprocess one transcript
    Retry {
        /// Otter conversation ID
        conversation_id: String,
    },

    /// Team-call classification settings
    Config(TranscriptConfigArgs),
}

#[derive(Debug, Args)]
pub struct TranscriptConfigArgs {
    #[command(subcommand)]
    pub command: TranscriptConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum TranscriptConfigCommand {
    /// Show indicators and destination folders
    Show,

    /// Add a keyword that marks a call as a team call
    AddIndicator { indicator: String },

    /// Remove a team-call keyword
    RemoveIndicator { indicator: String },

    /// Rename the destination folders
    SetFolders {
        #[arg(long)]
        team: Option<String>,

        #[arg(long)]
        private: Option<String>,
    },
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommand,
}

#[derive(Debug, Subcommand)]
pub enum PipelineCommand {
    /// Scheduler state
    Status,

    /// Dashboard: status, processing totals and performance
    Summary,

    /// Recent runs
    Runs {
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Recent processing errors
    Errors {
        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Show counts per error type instead
        #[arg(long)]
        by_type: bool,
    },

    /// Processed and failed counts per day
    DailyStats {
        #[arg(long, default_value_t = 14)]
        days: u32,
    },

    /// Start the scheduler
    Start {
        /// Send even if the pipeline already runs
        #[arg(long)]
        force: bool,
    },

    /// Stop the scheduler
    Stop {
        /// Send even if the pipeline is not running
        #[arg(long)]
        force: bool,
    },

    /// Run one batch now
    Trigger,

    /// Reset failed transcripts for reprocessing
    RetryFailed {
        /// Send even if nothing has failed
        #[arg(long)]
        force: bool,
    },

    /// Follow the dashboard until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },

    /// Scheduler settings
    Config(PipelineConfigArgs),
}

#[derive(Debug, Args)]
pub struct PipelineConfigArgs {
    #[command(subcommand)]
    pub command: PipelineConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum PipelineConfigCommand {
    /// Show current settings
    Show,

    /// Change one or more settings, e.g. `batch_size=20 enabled=false`
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the resolved configuration (passwords masked)
    Show,

    /// Store a profile's password in the system keyring
    SetPassword,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
