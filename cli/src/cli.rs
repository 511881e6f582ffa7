//! Command-line interface for opsdesk

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "Creator-ops console: spreadsheet ingestion and table reconciliation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location (defaults to the current directory)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the opsdesk workspace and operational tables
    Init,

    /// List the available ingestion modes
    Modes,

    /// List the available edit targets
    Targets,

    /// Load an uploaded leaderboard CSV into its destination table
    Ingest {
        /// Path to the uploaded CSV file
        file: PathBuf,

        /// Ingestion mode (see `opsdesk modes`)
        #[arg(long)]
        mode: String,

        /// Append to the destination instead of replacing its contents
        #[arg(long)]
        append: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Creator registry operations
    Creator {
        #[command(subcommand)]
        command: CreatorCommand,
    },

    /// Content submission operations
    Submission {
        #[command(subcommand)]
        command: SubmissionCommand,
    },

    /// Export a filtered snapshot of an edit target for offline editing
    Export {
        /// Edit target (see `opsdesk targets`)
        target: String,

        /// Earliest date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Latest date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Case-insensitive substring filter on the target's handle column
        #[arg(long)]
        id_like: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pending changes in the open snapshot
    Diff {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write pending changes back to the live table
    Apply {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CreatorCommand {
    /// Register a new creator
    Add {
        /// Agency name, must match a configured agency exactly
        #[arg(long)]
        agency: String,

        /// TikTok handle, without the leading '@'
        #[arg(long)]
        tiktok_id: String,

        /// Exact follower count if known; omit when unknown
        #[arg(long, default_value_t = 0)]
        followers: u64,

        #[arg(long)]
        full_name: String,

        /// City / country
        #[arg(long)]
        domicile: String,

        /// Platform UID, digits only
        #[arg(long)]
        uid: String,

        /// Phone number without the +62 country code
        #[arg(long)]
        phone: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List registered creators
    List {
        /// Show only the creator with this exact handle
        #[arg(long)]
        tiktok_id: Option<String>,

        /// Earliest registration date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Latest registration date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SubmissionCommand {
    /// Record a new content submission for a registered creator
    Add {
        /// Handle of the submitting creator
        #[arg(long)]
        tiktok_id: String,

        /// Category name, must match a configured category exactly
        #[arg(long)]
        category: String,

        /// Post type label, e.g. "Video Normal Posting"
        #[arg(long)]
        post_type: String,

        /// TikTok post link
        #[arg(long)]
        link: String,

        /// Posting date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        posting_date: Option<String>,
    },
}
