//! # Config Loader
//!
//! Reads a tracker configuration file into a validated `TrackerBlueprint`.
//!
//! Keys left out of the file take their defaults. Validation runs after
//! parsing and again after command-line overrides, so a blueprint handed to
//! the tracker has always passed it.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, LinkOverride};
//! use std::path::Path;
//!
//! let overrides = LinkOverride { host: Some("10.25.2.11".into()), port: None };
//! let blueprint = ConfigLoader::load_with_overrides(Path::new("tracker.toml"), &overrides)?;
//! println!("Vision peer: {}", blueprint.link.address());
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod parser;
mod validator;

pub use contracts::TrackerBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Vision peer address given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOverride {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl LinkOverride {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none()
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a file; the format follows the extension (`.toml` / `.json`)
    ///
    /// # Errors
    /// Unreadable file, unknown extension, parse failure or validation
    /// failure.
    pub fn load_from_path(path: &Path) -> Result<TrackerBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = format.name(), "Read configuration");
        Self::load_from_str(&content, format)
    }

    /// Load a file, then point the link at the overridden peer
    ///
    /// The result is validated again, so an override such as port 0 is
    /// rejected like the same value in the file would be.
    pub fn load_with_overrides(
        path: &Path,
        overrides: &LinkOverride,
    ) -> Result<TrackerBlueprint, ContractError> {
        let mut blueprint = Self::load_from_path(path)?;
        if overrides.is_empty() {
            return Ok(blueprint);
        }

        if let Some(host) = &overrides.host {
            debug!(host = %host, "Overriding vision host");
            blueprint.link.host = host.clone();
        }
        if let Some(port) = overrides.port {
            debug!(port, "Overriding vision port");
            blueprint.link.port = port;
        }
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Parse and validate configuration text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TrackerBlueprint, ContractError> {
        let blueprint = format.parse(content)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[link]
host = "10.25.2.11"
port = 6060

[pursuit]
period_ms = 50
zone = 0.2

[dispatcher]
period_ms = 100

[[dispatcher.channels]]
index = 2
actuator = "traam"

[[dispatcher.channels]]
index = 2
actuator = "shooter_wheel"

[firing]
max_shots = 4
min_interval_ms = 1500
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.link.host, "10.25.2.11");
        assert_eq!(bp.dispatcher.channels[1].actuator, "shooter_wheel");
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_overrides_replace_peer() {
        let file = config_file(MINIMAL_TOML);
        let overrides = LinkOverride {
            host: Some("127.0.0.1".to_string()),
            port: Some(7070),
        };
        let bp = ConfigLoader::load_with_overrides(file.path(), &overrides).unwrap();
        assert_eq!(bp.link.address(), "127.0.0.1:7070");
        assert_eq!(bp.firing.min_interval_ms, 1500);
    }

    #[test]
    fn test_overrides_are_validated() {
        let file = config_file(MINIMAL_TOML);
        let overrides = LinkOverride {
            host: Some(String::new()),
            port: None,
        };
        let err = ConfigLoader::load_with_overrides(file.path(), &overrides).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let file = config_file(MINIMAL_TOML);
        let bp = ConfigLoader::load_with_overrides(file.path(), &LinkOverride::default()).unwrap();
        assert_eq!(bp.link.host, "10.25.2.11");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[dispatcher.channels]]
index = 2
actuator = "traam"

[[dispatcher.channels]]
index = 1
actuator = "traam"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path() {
        let file = config_file(MINIMAL_TOML);
        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.link.port, 6060);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
