pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result};
use onionskin::{ViewMode, Viewport};
use serde::{Deserialize, Serialize};

pub use self::resolve::{CliOverrides, ResolvedCompareConfig};
pub use self::template::{config_file_exists, write_template};

pub(crate) const CONFIG_DIR: &str = ".onionskin";
const CONFIG_FILE: &str = "config.toml";

/// `[view]` — starting state of the comparison.
///
/// Numeric fields are clamped by the session, so out of range values are
/// accepted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ViewMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<i32>,
}

/// `[diff]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Mean channel distance a pixel must exceed to count as changed (0-50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<i32>,
}

/// `[render]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// `WIDTHxHEIGHT`; omitted = size of the larger image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Parsed `[render] viewport`, validated.
    pub fn viewport(&self) -> Result<Option<Viewport>> {
        self.render
            .viewport
            .as_deref()
            .map(|v| v.parse::<Viewport>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("render.viewport: {e}"))
    }
}

/// Load `<dir>/config.toml`. A missing file is not an error.
pub fn load_from(dir: &Path) -> Result<Option<Config>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    config.viewport()?;
    Ok(Some(config))
}

pub fn load() -> Result<Option<Config>> {
    load_from(Path::new(CONFIG_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(dir.path()).unwrap().is_none());
    }

    #[test]
    fn parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[view]\nmode = \"side-by-side\"\nopacity = 40\nzoom = 150\n\n\
             [diff]\nsensitivity = 25\n\n[render]\nviewport = \"320x200\"\n",
        )
        .unwrap();
        let config = load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config.view.mode, Some(ViewMode::SideBySide));
        assert_eq!(config.view.opacity, Some(40));
        assert_eq!(config.view.zoom, Some(150));
        assert_eq!(config.diff.sensitivity, Some(25));
        assert_eq!(config.viewport().unwrap(), Some(Viewport::new(320, 200)));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let config = load_from(dir.path()).unwrap().unwrap();
        assert!(config.view.mode.is_none());
        assert!(config.viewport().unwrap().is_none());
    }

    #[test]
    fn bad_viewport_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[render]\nviewport = \"wide\"\n",
        )
        .unwrap();
        let err = load_from(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("render.viewport"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[view]\nmode = \"swipe\"\n").unwrap();
        assert!(load_from(dir.path()).is_err());
    }
}
