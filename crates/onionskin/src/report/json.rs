use anyhow::{Context, Result};

use super::Summary;

pub fn print_summary(summary: &Summary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}
