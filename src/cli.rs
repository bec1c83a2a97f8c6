use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dvrindex")]
#[command(author, version, about = "DVR recording time index tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every entry of an index file
    Dump {
        /// Index file to read
        #[arg(required = true)]
        index: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a time to a byte offset in one index file
    Lookup {
        /// Index file to search
        #[arg(required = true)]
        index: PathBuf,

        /// Target timestamp
        time: u64,
    },

    /// Check an index file for torn records and timestamp regressions
    Verify {
        /// Index file to check
        #[arg(required = true)]
        index: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Truncate a torn trailing record left by a crash
    Recover {
        /// Index file to repair
        #[arg(required = true)]
        index: PathBuf,
    },

    /// Append one entry to an index file
    Append {
        /// Index file to append to (created if missing)
        #[arg(required = true)]
        index: PathBuf,

        /// Entry timestamp
        time: u64,

        /// Byte offset in the segment file
        offset: u64,
    },

    /// List the segments of a recording manifest
    Segments {
        /// Manifest file
        #[arg(required = true)]
        manifest: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a time to a segment file and byte offset
    Seek {
        /// Manifest file
        #[arg(required = true)]
        manifest: PathBuf,

        /// Target timestamp
        time: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
