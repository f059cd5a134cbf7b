//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Moodlog - Track your mood and learn what lifts it
#[derive(Parser)]
#[command(name = "moodlog")]
#[command(about = "Self-hosted mood journal with insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "moodlog.db", global = true)]
    pub db: PathBuf,

    /// User id the journal belongs to
    #[arg(long, default_value = "local-dev", global = true)]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set MOODLOG_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show database status (encryption, size, entry counts)
    Status,

    /// Manage journal entries (list, add, show, edit, delete)
    Journal {
        #[command(subcommand)]
        action: Option<JournalAction>,
    },

    /// List the reasons you have used, most frequent first
    Reasons,

    /// Show how each reason relates to your average mood
    Insights {
        /// Minimum entries a reason needs before it is highlighted
        #[arg(long, default_value = "3")]
        min_entries: usize,
    },

    /// Show journal and breathing streaks
    Streak,

    /// Breathing exercises (list patterns, show a timeline, log a session)
    Breathe {
        #[command(subcommand)]
        action: Option<BreatheAction>,
    },

    /// Import journal entries from CSV (date,mood,reasons,content)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export journal entries
    Export {
        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Reset the database (clear data)
    Reset {
        /// Soft reset: clear journal entries and breathing sessions but keep the audit log
        /// Without this flag, performs a hard reset (deletes DB file and re-initializes)
        #[arg(long)]
        soft: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access authentication headers.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum JournalAction {
    /// List entries, newest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only entries tagged with this reason
        #[arg(long)]
        reason: Option<String>,
    },

    /// Add an entry
    Add {
        /// Mood score (1-10)
        #[arg(short, long)]
        mood: i32,

        /// Reasons (comma-separated, e.g. "Work,Sleep")
        #[arg(short, long, value_delimiter = ',')]
        reasons: Vec<String>,

        /// Entry date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show a single entry
    Show {
        /// Entry ID
        id: i64,
    },

    /// Edit an entry (only the given fields change)
    Edit {
        /// Entry ID
        id: i64,

        /// New mood score (1-10)
        #[arg(short, long)]
        mood: Option<i32>,

        /// Replace reasons (comma-separated; pass "" to clear)
        #[arg(short, long, value_delimiter = ',')]
        reasons: Option<Vec<String>>,

        /// New entry date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Replace the note (pass "" to clear)
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BreatheAction {
    /// List available breathing patterns
    Patterns,

    /// Show the phase timeline for a pattern
    Show {
        /// Pattern name (box, four_seven_eight, coherent, relaxing)
        pattern: String,

        /// Number of cycles
        #[arg(short, long, default_value = "4")]
        cycles: u32,
    },

    /// Log a completed breathing session
    Log {
        /// Pattern name (box, four_seven_eight, coherent, relaxing)
        pattern: String,

        /// Number of cycles completed
        #[arg(short, long, default_value = "4")]
        cycles: u32,

        /// Session date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}
