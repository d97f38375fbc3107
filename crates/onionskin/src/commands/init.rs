use anyhow::{Result, bail};

use crate::config;

/// `onionskin init` — create .onionskin/config.toml.
pub fn init(force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".onionskin/config.toml already exists (use --force to overwrite)");
    }

    config::write_template()?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .onionskin/config.toml");
    Ok(())
}
