use std::path::PathBuf;

use clap::{Parser, Subcommand};
use onionskin::{ViewMode, Viewport};

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    s.parse()
}

#[derive(Parser)]
#[command(
    name = "onionskin",
    about = "Compare two versions of an image: onion skin, side by side, or pixel diff"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .onionskin/config.toml with commented defaults
    Init {
        /// Overwrite an existing config
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare a previous and a current image
    Compare {
        /// Previous version: file path or data: URL (omit for a new file)
        #[arg(long, short = 'p')]
        previous: Option<String>,
        /// Current version: file path or data: URL (omit for a deleted file)
        #[arg(long, short = 'c')]
        current: Option<String>,
        /// View mode (overrides config)
        #[arg(long, short = 'm', value_enum)]
        mode: Option<ViewMode>,
        /// Diff threshold, 0-50 (overrides config)
        #[arg(long, short = 's', allow_negative_numbers = true)]
        sensitivity: Option<i32>,
        /// Onion-skin opacity of the current image, 0-100
        #[arg(long, allow_negative_numbers = true)]
        opacity: Option<i32>,
        /// Onion-skin zoom percent, 25-400 (snapped to steps of 25)
        #[arg(long, allow_negative_numbers = true)]
        zoom: Option<i32>,
        /// Horizontal onion-skin pan in view pixels
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pan_x: f64,
        /// Vertical onion-skin pan in view pixels
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pan_y: f64,
        /// Render size as WIDTHxHEIGHT (default: larger image)
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<Viewport>,
        /// Write the rendered view to this PNG
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Print a JSON summary instead of the terminal report
        #[arg(long)]
        json: bool,
    },
}
