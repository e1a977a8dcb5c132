use thiserror::Error;

use crate::pipeline::Phase;

/// Failures of a layout run.
///
/// Layout of a validated graph always succeeds; the only way a run ends
/// early is through cooperative cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout cancelled before the {phase} phase")]
    Cancelled { phase: Phase },
}

/// A preset name that matches none of [`Preset::ALL`](crate::config::Preset::ALL).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset `{0}`; expected compact, interactive, publication or landscape")]
pub struct UnknownPreset(pub String);
