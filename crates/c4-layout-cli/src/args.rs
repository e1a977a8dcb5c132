//! Command-line argument definitions for the c4-layout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! and preset selection, the view to lay out, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the c4-layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input graph document (TOML)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output JSON file
    #[arg(short, long, default_value = "layout.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Named option preset (compact, interactive, publication, landscape)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// View to lay out: all, landscape, context:<id>, container:<id> or component:<id>
    #[arg(long, default_value = "all")]
    pub view: String,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
