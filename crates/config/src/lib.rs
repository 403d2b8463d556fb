pub mod schema;

pub use schema::{EndpointConfig, MonitorConfig, ReconnectPolicy, RenderConfig, WindowConfig};

use emg_core::{EmgError, Result};
use std::path::{Path, PathBuf};

/// Load and validate configuration from a TOML file.  Returns
/// `MonitorConfig::default()` if the file doesn't exist so the monitor always
/// has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(MonitorConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| EmgError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: MonitorConfig =
        toml::from_str(&raw).map_err(|e| EmgError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;

    tracing::info!("Loaded config from '{}'", path.display());
    Ok(config)
}

/// Return the config path: `$EMG_CONFIG` if set, otherwise `emg/emg.toml`
/// under `$XDG_CONFIG_HOME` (or `~/.config`).
pub fn default_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("EMG_CONFIG") {
        return PathBuf::from(explicit);
    }

    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("emg").join("emg.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, MonitorConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ncapacity = 3\n\n[render]\nprecision = 4").unwrap();

        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.window.capacity, 3);
        assert_eq!(cfg.render.precision, 4);
        assert!(cfg.render.sparkline);
    }

    #[test]
    fn invalid_values_fail_fast() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ncapacity = 0").unwrap();

        assert!(matches!(load(file.path()), Err(EmgError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window\ncapacity = ").unwrap();

        assert!(matches!(load(file.path()), Err(EmgError::Config(_))));
    }
}
