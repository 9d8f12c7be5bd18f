use std::fs;
use std::path::Path;

use anyhow::Context;
use audiff_diff::DiffSettings;
use tracing::debug;

/// Load settings from `path`, or the defaults when no file is given.
pub fn load(path: Option<&Path>) -> anyhow::Result<DiffSettings> {
    let Some(path) = path else {
        return Ok(DiffSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings = DiffSettings::from_toml_str(&text)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}
