//! CLI argument definitions using clap
//!
//! Commands:
//! - notes config show|import <file>
//! - notes list [QUERY] [--limit N] [--sort FIELD]
//! - notes add <TITLE> [-c CONTENT] [-l LABELS]
//! - notes read <ID>
//! - notes update <ID> [-t TITLE] [-c CONTENT] [-l LABELS]
//! - notes attachments list <ID>

use clap::{Args, Parser, Subcommand, ValueEnum};
use notes_core::query::DEFAULT_LIST_LIMIT;
use std::path::PathBuf;

/// Manage notes across multiple backends
#[derive(Parser, Debug)]
#[command(name = "notes")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend to use; overrides NOTES_PROVIDER and the config file
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Log level (trace|debug|info|warn|error|off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write logs to stderr instead of the config directory
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// List notes with an optional Gmail-style query
    ///
    /// Examples: `notes list meeting`, `notes list "label:work -label:archived"`,
    /// `notes list --sort=-modified`
    List(ListArgs),

    /// Add a new note
    Add(AddArgs),

    /// Read a note by ID
    Read {
        id: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Update an existing note
    Update(UpdateArgs),

    /// Manage note attachments
    Attachments {
        #[command(subcommand)]
        action: AttachmentsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration and test the connection
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate a JSON config file and save it if the connection works
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AttachmentsCommand {
    /// List attachments for a note
    List {
        note_id: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Query, e.g. `meeting -label:archived`
    #[arg(allow_hyphen_values = true)]
    pub query: Option<String>,

    /// Maximum notes to return
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: usize,

    /// Sort field (created|modified); prefix with - for descending
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub title: String,

    /// Note content/body
    #[arg(short, long, default_value = "")]
    pub content: String,

    /// Labels (comma-separated)
    #[arg(short, long = "label", default_value = "")]
    pub labels: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New content/body
    #[arg(short, long)]
    pub content: Option<String>,

    /// New labels (comma-separated)
    #[arg(short, long = "label")]
    pub labels: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
