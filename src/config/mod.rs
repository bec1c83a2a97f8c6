mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./dvrindex.toml",
        "~/.config/dvrindex/config.toml",
        "/etc/dvrindex/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let recording = &config.recording;

    for (name, value) in [
        ("index_extension", &recording.index_extension),
        ("segment_extension", &recording.segment_extension),
    ] {
        if value.is_empty() || value.contains(['.', '/']) {
            anyhow::bail!("recording.{name} must be a bare extension, got {value:?}");
        }
    }

    if recording.index_extension == recording.segment_extension {
        anyhow::bail!("recording.index_extension must differ from segment_extension");
    }

    if recording.manifest_name.is_empty() || recording.manifest_name.contains('/') {
        anyhow::bail!(
            "recording.manifest_name must be a file name, got {:?}",
            recording.manifest_name
        );
    }

    if recording.segment_prefix.contains('/') {
        anyhow::bail!("recording.segment_prefix must not contain '/'");
    }

    if recording.max_segment_bytes == 0 && recording.max_segment_duration == 0 {
        tracing::warn!("No rotation threshold set; recordings will use a single segment");
    }

    Ok(())
}
