//! Errors surfaced by the command-line tool.

use std::{io, ops::Range, path::PathBuf};

use thiserror::Error;

use c4_layout::{LayoutError, UnknownPreset};
use c4_layout_core::error::ValidationError;

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read graph document: {message}")]
    Document {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown view `{0}`; expected all, landscape, context:<id>, container:<id> or component:<id>")]
    View(String),

    #[error("Failed to write layout: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn new_document_error(err: toml::de::Error, src: &str) -> Self {
        CliError::Document {
            message: err.message().to_string(),
            span: err.span(),
            src: src.to_string(),
        }
    }
}

/// Configuration-related errors for the CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error(transparent)]
    Preset(#[from] UnknownPreset),
}
