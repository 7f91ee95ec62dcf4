//! Blueprint text formats
//!
//! TOML is what `tracker.toml` ships as; JSON is accepted for generated
//! configs. Both go through the same serde defaults.

use std::path::Path;

use contracts::{ContractError, TrackerBlueprint};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format named by the file extension, case-insensitive
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "{}: cannot determine file format from extension",
                    path.display()
                ))
            })?;

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ContractError::config_parse(format!(
                "{}: unsupported config format: .{other}",
                path.display()
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Deserialize; missing keys take their defaults
    pub fn parse(self, content: &str) -> Result<TrackerBlueprint, ContractError> {
        let parsed: Result<TrackerBlueprint, BoxError> = match self {
            Self::Toml => toml::from_str(content).map_err(|e| Box::new(e) as BoxError),
            Self::Json => serde_json::from_str(content).map_err(|e| Box::new(e) as BoxError),
        };
        parsed.map_err(|source| ContractError::ConfigParse {
            message: format!("{} parse error: {source}", self.name()),
            source: Some(source),
        })
    }

    /// Serialize with every key spelled out
    pub fn render(self, blueprint: &TrackerBlueprint) -> Result<String, ContractError> {
        let rendered: Result<String, String> = match self {
            Self::Toml => toml::to_string_pretty(blueprint).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(blueprint).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| {
            ContractError::config_parse(format!("{} serialize error: {e}", self.name()))
        })
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;
