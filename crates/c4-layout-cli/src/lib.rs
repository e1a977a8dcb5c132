//! CLI logic for the c4-layout tool.
//!
//! Reads a TOML graph document, lays it out through the selected view and
//! writes the [`LayoutResult`](c4_layout::LayoutResult) as JSON.

pub mod document;
pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::{CliError, ConfigError};

use std::fs;

use log::info;

use c4_layout::{LayoutEngine, identifier::Id, view::ViewState};

use document::Document;

/// Run the c4-layout CLI application
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed documents and graph validation failures
/// - Unknown views
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let options = config::load_config(args.config.as_ref(), args.preset.as_deref())?;
    let view = parse_view(&args.view)?;

    let source = fs::read_to_string(&args.input)?;
    let graph = Document::parse(&source)?.into_graph()?;

    let result = LayoutEngine::new(options).layout(&graph, &view);
    let json = serde_json::to_string_pretty(&result)?;
    fs::write(&args.output, json)?;

    info!(
        output_file = args.output,
        nodes = result.nodes.len(),
        relationships = result.relationships.len();
        "Layout exported successfully"
    );

    Ok(())
}

/// Parses a `--view` value.
///
/// # Errors
///
/// Returns [`CliError::View`] for unknown view names and malformed ids.
pub fn parse_view(spec: &str) -> Result<ViewState, CliError> {
    let invalid = || CliError::View(spec.to_string());
    match spec.split_once(':') {
        None => match spec {
            "all" => Ok(ViewState::all()),
            "landscape" => Ok(ViewState::landscape()),
            _ => Err(invalid()),
        },
        Some((kind, raw)) => {
            let id = Id::new(raw).map_err(|_| invalid())?;
            match kind {
                "context" => Ok(ViewState::system_context(id)),
                "container" => Ok(ViewState::container(id)),
                "component" => Ok(ViewState::component(id)),
                _ => Err(invalid()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use c4_layout::view::ViewPreset;

    use super::*;

    #[test]
    fn test_parse_view() {
        assert_eq!(parse_view("all").unwrap(), ViewState::all());
        assert_eq!(parse_view("landscape").unwrap().preset, ViewPreset::Landscape);

        let view = parse_view("container:shop").unwrap();
        assert_eq!(view.preset, ViewPreset::Container);
        assert_eq!(view.focus.map(|f| f.id), Some(Id::new("shop").unwrap()));

        assert!(matches!(parse_view("sideways"), Err(CliError::View(_))));
        assert!(matches!(parse_view("context:9"), Err(CliError::View(_))));
        assert!(matches!(parse_view("deployment:shop"), Err(CliError::View(_))));
    }
}
