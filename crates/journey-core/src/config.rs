//! Journey configuration
//!
//! Loaded from an optional TOML file, then overridden from the
//! environment (`JOURNEY_GATEWAY_URL`, `JOURNEY_GATEWAY_KEY`). Missing
//! gateway credentials are not an error: the controller then runs
//! unconfigured and rejects every write.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the gateway base URL
pub const ENV_GATEWAY_URL: &str = "JOURNEY_GATEWAY_URL";
/// Environment variable holding the gateway API key
pub const ENV_GATEWAY_KEY: &str = "JOURNEY_GATEWAY_KEY";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    /// Persistence gateway connection
    pub gateway: GatewayConfig,
    /// Placeholder text for newly created records
    pub placeholders: Placeholders,
    /// Where CSV exports are written
    pub export_dir: Option<PathBuf>,
}

impl JourneyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With gateway credentials
    #[inline]
    #[must_use]
    pub fn with_gateway(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.gateway.url = Some(url.into());
        self.gateway.api_key = Some(api_key.into());
        self
    }

    /// With export directory
    #[inline]
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Load from an optional file, then apply process environment overrides
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid TOML for this shape
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.apply_env(|key| std::env::var(key).ok()))
    }

    /// Parse a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io`, `ConfigError::Parse`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse`
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override gateway credentials from an environment lookup
    #[must_use]
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_GATEWAY_URL).filter(|v| !v.trim().is_empty()) {
            self.gateway.url = Some(url);
        }
        if let Some(key) = lookup(ENV_GATEWAY_KEY).filter(|v| !v.trim().is_empty()) {
            self.gateway.api_key = Some(key);
        }
        self
    }
}

/// Gateway connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the hosted store
    pub url: Option<String>,
    /// API key sent as `apikey` and bearer token
    pub api_key: Option<String>,
    /// REST path prefix under the base URL
    pub rest_path: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            rest_path: "rest/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Both URL and key are present and non-blank
    #[must_use]
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.api_key)
    }

    /// Base URL of the REST endpoint, always ending in `/`
    ///
    /// # Errors
    /// - `ConfigError::InvalidUrl` if the URL is missing or malformed
    pub fn rest_base(&self) -> Result<Url, ConfigError> {
        let raw = self.url.as_deref().unwrap_or_default().trim();
        let invalid = |message: String| ConfigError::InvalidUrl {
            url: raw.to_string(),
            message,
        };

        let mut base = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a base url".to_string()));
        }
        let path = format!(
            "{}/{}/",
            base.path().trim_end_matches('/'),
            self.rest_path.trim_matches('/')
        );
        base.set_path(&path);
        Ok(base)
    }
}

/// Placeholder text for records created before the user edits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub stage_name: String,
    pub step_action: String,
    pub step_goal: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            stage_name: "New Stage".to_string(),
            step_action: "New User Action".to_string(),
            step_goal: "New User Goal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_are_unconfigured() {
        let config = JourneyConfig::new();
        assert!(!config.gateway.is_configured());
        assert_eq!(config.placeholders.stage_name, "New Stage");
        assert_eq!(config.gateway.timeout_secs, 30);
    }

    #[test]
    fn parses_partial_toml() {
        let config = JourneyConfig::from_toml(
            r#"
            export_dir = "reports"

            [gateway]
            url = "https://db.example.com"
            timeout_secs = 5

            [placeholders]
            stage_name = "Untitled"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.url.as_deref(), Some("https://db.example.com"));
        assert_eq!(config.gateway.timeout_secs, 5);
        assert_eq!(config.gateway.rest_path, "rest/v1");
        assert_eq!(config.placeholders.stage_name, "Untitled");
        assert_eq!(config.placeholders.step_action, "New User Action");
        assert_eq!(config.export_dir, Some(PathBuf::from("reports")));
        assert!(!config.gateway.is_configured());
    }

    #[test]
    fn env_overrides_file() {
        let config = JourneyConfig::new()
            .with_gateway("https://file.example.com", "file-key")
            .apply_env(|key| match key {
                ENV_GATEWAY_URL => Some("https://env.example.com".to_string()),
                ENV_GATEWAY_KEY => Some("   ".to_string()),
                _ => None,
            });

        assert_eq!(config.gateway.url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.gateway.api_key.as_deref(), Some("file-key"));
        assert!(config.gateway.is_configured());
    }

    #[test]
    fn blank_key_is_not_configured() {
        let config = JourneyConfig::new().with_gateway("https://db.example.com", " ");
        assert!(!config.gateway.is_configured());
    }

    #[test]
    fn rest_base_appends_prefix() {
        let config = JourneyConfig::new().with_gateway("https://db.example.com/base/", "k");
        let base = config.gateway.rest_base().unwrap();
        assert_eq!(base.as_str(), "https://db.example.com/base/rest/v1/");
        assert_eq!(
            base.join("stages").unwrap().as_str(),
            "https://db.example.com/base/rest/v1/stages"
        );
    }

    #[test]
    fn rest_base_rejects_garbage() {
        let config = JourneyConfig::new().with_gateway("not a url", "k");
        assert!(matches!(
            config.gateway.rest_base(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nurl = \"https://x.example.com\"\napi_key = \"k\"").unwrap();

        let config = JourneyConfig::from_file(file.path()).unwrap();
        assert!(config.gateway.is_configured());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = JourneyConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
