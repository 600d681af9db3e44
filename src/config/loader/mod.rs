use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[cfg(unix)]
use tracing::warn;

use crate::config::StoreConfig;

/// Read, parse and validate a JSON config file.
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: StoreConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;

    check_file_permissions(path);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}

/// Warn when a file holding signing keys is readable by group or others.
#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                "config file {} has permissive mode {:o}; it contains session keys, consider chmod 600",
                path.display(),
                mode & 0o777
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {}
