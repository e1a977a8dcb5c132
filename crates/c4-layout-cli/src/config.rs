//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory)
//! and layering them over a named preset.
//!
//! ```toml
//! preset = "publication"
//!
//! [layout]
//! direction = "left-right"
//!
//! [layout.routing]
//! clearance = 20.0
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use c4_layout::{LayoutOptions, Preset};

use crate::error::{CliError, ConfigError};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    preset: Option<Preset>,
    layout: toml::Table,
}

/// Find and load layout options from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (c4-layout/config.toml)
/// 3. Platform-specific config directory
/// 4. Default options if none found
///
/// A `preset` argument overrides the preset named in the file; keys under
/// `[layout]` override whatever the preset sets.
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
/// - The preset name is unknown
pub fn load_config(
    explicit_path: Option<impl AsRef<Path>>,
    preset: Option<&str>,
) -> Result<LayoutOptions, CliError> {
    let file = match find_config(explicit_path) {
        Some(path) => read_config_file(&path)?,
        None => {
            debug!("No configuration file found, using default configuration");
            ConfigFile::default()
        }
    };

    let preset = match preset {
        Some(name) => Some(name.parse::<Preset>().map_err(ConfigError::Preset)?),
        None => file.preset,
    };
    let base = preset.map(Preset::options).unwrap_or_default();
    if let Some(preset) = preset {
        info!(preset:% = preset; "Using layout preset");
    }

    Ok(apply_overrides(base, &file.layout)?)
}

fn find_config(explicit_path: Option<impl AsRef<Path>>) -> Option<PathBuf> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return Some(path.to_path_buf());
    }

    // 2. Try the local project directory
    let local_config = Path::new("c4-layout/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return Some(local_config.to_path_buf());
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "c4-layout", "c4-layout") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return Some(system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    None
}

fn read_config_file(path: &Path) -> Result<ConfigFile, CliError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    let content = fs::read_to_string(path)?;
    let file = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(file)
}

/// Layers the `[layout]` table over `base`, key by key.
fn apply_overrides(base: LayoutOptions, overrides: &toml::Table) -> Result<LayoutOptions, ConfigError> {
    if overrides.is_empty() {
        return Ok(base);
    }
    let to_json = |e: serde_json::Error| ConfigError::Parse(e.to_string());
    let measurer = base.measurer.clone();
    let mut merged = serde_json::to_value(&base).map_err(to_json)?;
    merge(&mut merged, serde_json::to_value(overrides).map_err(to_json)?);
    let options: LayoutOptions = serde_json::from_value(merged).map_err(to_json)?;
    Ok(options.with_measurer(measurer))
}

fn merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}

#[cfg(test)]
mod tests {
    use c4_layout::view::Direction;

    use super::*;

    fn parse(src: &str) -> ConfigFile {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_overrides_keep_preset_values() {
        let file = parse(
            r#"
            preset = "compact"

            [layout.spacing]
            node = 33.0
            "#,
        );
        let base = file.preset.map(Preset::options).unwrap_or_default();
        let options = apply_overrides(base, &file.layout).unwrap();
        assert_eq!(options.spacing.node, 33.0);
        assert_eq!(options.spacing.rank, Preset::Compact.options().spacing.rank);
        assert!(!options.distribution.enabled);
    }

    #[test]
    fn test_top_level_layout_keys() {
        let file = parse(
            r#"
            [layout]
            direction = "left-right"
            debug = true
            "#,
        );
        let options = apply_overrides(LayoutOptions::default(), &file.layout).unwrap();
        assert_eq!(options.direction, Direction::LeftRight);
        assert!(options.debug);
    }

    #[test]
    fn test_missing_file_and_unknown_preset() {
        let err = load_config(Some("/nonexistent/c4-layout.toml"), None).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::MissingFile(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        let err = load_config(Some(&path), Some("sketchy")).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Preset(_))));
    }

    #[test]
    fn test_explicit_file_with_preset_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "preset = \"compact\"\n[layout.overlap]\npadding = 5.0\n").unwrap();
        let options = load_config(Some(&path), Some("publication")).unwrap();
        assert_eq!(options.overlap.padding, 5.0);
        assert!(options.local_swap.enabled);
    }
}
