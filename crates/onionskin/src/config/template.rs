use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-written config template with every key commented out, so
/// `onionskin init` documents the available knobs.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Starting view — all fields optional.
# ─────────────────────────────────────────────────────────
[view]
# mode = "onion-skin"               # "onion-skin" | "side-by-side" | "diff"
# opacity = 100                     # 0 = only previous, 100 = only current
# zoom = 100                        # 25-400, in steps of 25

# ─────────────────────────────────────────────────────────
# Pixel diff — all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# sensitivity = 10                  # 0-50, mean channel distance to count as changed

# ─────────────────────────────────────────────────────────
# Rendering — all fields optional.
# ─────────────────────────────────────────────────────────
[render]
# viewport = "1280x720"             # default: size of the larger image
"#;

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_DIR).join(CONFIG_FILE).exists()
}

/// Write the commented template to `<dir>/config.toml`.
pub fn write_template_to(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_template() -> Result<()> {
    write_template_to(Path::new(CONFIG_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from;

    #[test]
    fn template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(CONFIG_DIR);
        write_template_to(&target).unwrap();
        let config = load_from(&target).unwrap().unwrap();
        assert!(config.view.mode.is_none());
        assert!(config.diff.sensitivity.is_none());
        assert!(config.render.viewport.is_none());
    }
}
