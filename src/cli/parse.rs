//! CLI parse: clap types for Hearth. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hearth CLI - Rental listing collection with edit-preserving reconciliation
#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Collect rental listings and reconcile them without clobbering manual edits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect one or more listings by URL
    Add {
        /// Listing URLs to collect
        #[arg(required_unless_present = "file")]
        urls: Vec<String>,
        /// File with one listing URL per line
        #[arg(long)]
        file: Option<PathBuf>,
        /// Clear fingerprints first so manual edits are overwritten
        #[arg(long)]
        reset: bool,
    },
    /// Re-collect every stored listing
    Rescrape {
        /// Overwrite manually edited fields, notes and decisions included
        #[arg(long)]
        ignore_protection: bool,
        /// Skip the confirmation prompt for --ignore-protection
        #[arg(long)]
        yes: bool,
    },
    /// List stored listings
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Show only listings with this decision
        #[arg(long)]
        decision: Option<String>,
    },
    /// Show one stored listing
    Show {
        /// Listing URL
        url: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show or set manual notes
    Notes {
        /// Listing URL (omit to list all listings with notes)
        url: Option<String>,
        /// New notes text; without it the current notes are shown
        #[arg(long, requires = "url")]
        set: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Set the decision on a listing
    Decide {
        /// Listing URL
        url: String,
        /// Decision (Pending Review, Interested, Shortlisted,
        /// Appointment Scheduled, Rejected)
        decision: String,
    },
    /// Delete all stored listings and their fingerprints
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Field protection ledger (status, reset, protect)
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Page content cache (stats, purge, clear)
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Show recorded fingerprints
    Status {
        /// Scope to one listing URL (omit for all)
        url: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show fields a rescrape would keep, per listing
    Protected {
        /// Scope to one listing URL (omit for all)
        url: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove fingerprints so the next scrape overwrites the fields
    Reset {
        /// Listing URL
        url: String,
        /// Comma-separated field names (omit for all fields)
        #[arg(long)]
        fields: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Force-protect fields so scrapes never overwrite them
    Protect {
        /// Listing URL
        url: String,
        /// Comma-separated field names
        fields: String,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache statistics
    Stats {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove cached pages older than the freshness window
    Purge {
        /// Age threshold in hours (default: configured max age)
        #[arg(long)]
        older_than_hours: Option<u64>,
    },
    /// Remove all cached pages
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
