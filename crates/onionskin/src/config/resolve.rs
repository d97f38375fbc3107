use anyhow::{Context, Result};
use clap::ValueEnum;
use onionskin::session::{DEFAULT_OPACITY, DEFAULT_ZOOM};
use onionskin::diff::DEFAULT_SENSITIVITY;
use onionskin::{ViewMode, Viewport};

use super::{Config, load};

/// Values extracted from the CLI that participate in the merge.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub mode: Option<ViewMode>,
    pub sensitivity: Option<i32>,
    pub opacity: Option<i32>,
    pub zoom: Option<i32>,
    pub viewport: Option<Viewport>,
}

/// Fully resolved settings after CLI > env > file > defaults merge.
#[derive(Debug, PartialEq)]
pub struct ResolvedCompareConfig {
    pub mode: ViewMode,
    pub sensitivity: i32,
    pub opacity: i32,
    pub zoom: i32,
    /// `None` = derive from the images.
    pub viewport: Option<Viewport>,
}

impl ResolvedCompareConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file = load()?.unwrap_or_default();
        Self::merge(cli, |k| std::env::var(k).ok(), file)
    }

    fn merge(
        cli: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
        file: Config,
    ) -> Result<Self> {
        // 1. Env layer
        let env_sensitivity: Option<i32> = env("ONIONSKIN_SENSITIVITY")
            .map(|v| v.trim().parse::<i32>())
            .transpose()
            .context("ONIONSKIN_SENSITIVITY must be an integer")?;
        let env_mode: Option<ViewMode> = env("ONIONSKIN_MODE")
            .map(|v| ViewMode::from_str(v.trim(), true))
            .transpose()
            .map_err(|e| anyhow::anyhow!("ONIONSKIN_MODE: {e}"))?;

        // 2. CLI > env > file > defaults
        let mode = cli
            .mode
            .or(env_mode)
            .or(file.view.mode)
            .unwrap_or_default();
        let sensitivity = cli
            .sensitivity
            .or(env_sensitivity)
            .or(file.diff.sensitivity)
            .unwrap_or(i32::from(DEFAULT_SENSITIVITY));
        let opacity = cli
            .opacity
            .or(file.view.opacity)
            .unwrap_or(i32::from(DEFAULT_OPACITY));
        let zoom = cli
            .zoom
            .or(file.view.zoom)
            .unwrap_or(i32::from(DEFAULT_ZOOM));
        let viewport = match cli.viewport {
            Some(vp) => Some(vp),
            None => file.viewport()?,
        };

        Ok(Self {
            mode,
            sensitivity,
            opacity,
            zoom,
            viewport,
        })
    }
}
