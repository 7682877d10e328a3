//! CLI command definitions and handlers for the `lkeep` binary.
//!
//! Uses clap derive macros. One subcommand per agent operation:
//! `lkeep ingest`, `lkeep character`, `lkeep find-scene`, ...

pub mod ingest;
pub mod query;
pub mod reset;
pub mod stats;
pub mod summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Build and query a continuity knowledge base for a TV series.
#[derive(Parser)]
#[command(name = "lkeep", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Series name; namespaces the stored collections.
    #[arg(long, global = true, env = "LOREKEEP_SERIES", default_value = "default_series")]
    pub series: String,

    /// Directory holding the vector database (default: ~/.lorekeep).
    #[arg(long, global = true, env = "LOREKEEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process an episode transcript into the knowledge base.
    Ingest {
        /// Path to the transcript text file.
        transcript: PathBuf,

        #[arg(short, long)]
        season: u32,

        #[arg(short, long)]
        episode: u32,

        #[arg(short, long)]
        title: String,

        /// Original air date (YYYY-MM-DD).
        #[arg(long)]
        air_date: Option<String>,
    },

    /// Generate a comprehensive episode summary.
    Summary {
        season: u32,
        episode: u32,
    },

    /// Show a character profile.
    Character {
        /// Exact character name.
        name: String,
    },

    /// Show the relationship history between two characters.
    Relationship {
        character1: String,
        character2: String,
    },

    /// Summarize a plot arc.
    Arc {
        /// Plot arc name/tag.
        name: String,
    },

    /// Find scenes matching a description (semantic search).
    #[command(name = "find-scene")]
    FindScene {
        query: String,

        /// Number of results.
        #[arg(short, long, default_value_t = 5)]
        n_results: usize,
    },

    /// Search across all collections.
    Search {
        query: String,

        /// Number of results per collection.
        #[arg(short, long, default_value_t = 5)]
        n_results: usize,
    },

    /// Track clues and resolution of a mystery.
    Mystery {
        description: String,
    },

    /// Show everything known before a given episode.
    Context {
        season: u32,
        episode: u32,
    },

    /// Show series statistics.
    Stats,

    /// Check component health.
    Health,

    /// Delete all stored knowledge for the series.
    #[command(alias = "reset-database")]
    Reset {
        /// Skip the interactive confirmation.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
