//! Optional TOML configuration file.
//!
//! Every key is optional; command line flags override file values, file
//! values override built-in defaults.
//!
//! ```toml
//! host = "192.168.1.40"
//! invert = true
//! device = "rm2"
//!
//! [tools]
//! head = "/opt/bin/head"
//! compressor = "/opt/bin/lz4"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rmsnap_core::{CaptureConfig, CaptureConfigBuilder, DeviceModel, RemoteTools};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub invert: Option<bool>,
    pub output: Option<String>,
    pub device: Option<DeviceModel>,
    pub tools: Option<ToolsSection>,
    pub ssh: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    pub head: Option<String>,
    pub compressor: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub invert: bool,
    pub output: Option<String>,
    pub device: Option<DeviceModel>,
}

/// Merge file and command line into one capture configuration.
pub fn resolve(file: FileConfig, overrides: Overrides) -> CaptureConfig {
    let defaults = RemoteTools::default();
    let tools = file.tools.unwrap_or_default();
    let tools = RemoteTools {
        head: tools.head.unwrap_or(defaults.head),
        compressor: tools.compressor.unwrap_or(defaults.compressor),
    };

    let mut builder: CaptureConfigBuilder = CaptureConfig::builder()
        .invert(overrides.invert || file.invert.unwrap_or(false))
        .tools(tools);
    if let Some(host) = overrides.host.or(file.host) {
        builder = builder.host(host);
    }
    if let Some(user) = overrides.user.or(file.user) {
        builder = builder.user(user);
    }
    if let Some(output) = overrides.output.or(file.output) {
        builder = builder.output_name(output);
    }
    if let Some(device) = overrides.device.or(file.device) {
        builder = builder.device(device);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = r#"
host = "192.168.1.40"
invert = true
device = "rm1"

[tools]
compressor = "/home/root/bin/lz4"
"#;
        file.write_all(content.as_bytes()).unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.host.as_deref(), Some("192.168.1.40"));
        assert_eq!(config.invert, Some(true));
        assert_eq!(config.device, Some(DeviceModel::Remarkable1));

        let resolved = resolve(config, Overrides::default());
        assert_eq!(resolved.host, "192.168.1.40");
        assert!(resolved.invert);
        assert_eq!(resolved.tools.head, "/opt/bin/head");
        assert_eq!(resolved.tools.compressor, "/home/root/bin/lz4");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hots = \"typo\"").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_command_line_wins() {
        let file = FileConfig {
            host: Some("from-file".to_string()),
            output: Some("file-name".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            host: Some("from-cli".to_string()),
            device: Some(DeviceModel::Remarkable2),
            ..Default::default()
        };

        let config = resolve(file, overrides);
        assert_eq!(config.host, "from-cli");
        assert_eq!(config.output_name, "file-name");
        assert_eq!(config.device, Some(DeviceModel::Remarkable2));
        assert!(!config.invert);
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(FileConfig::default(), Overrides::default());
        assert_eq!(config.host, "10.11.99.1");
        assert_eq!(config.user, "root");
        assert_eq!(config.output_name, "temp");
        assert_eq!(config.device, None);
    }
}
