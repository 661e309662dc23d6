//! Configuration loading from userlink.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// Main configuration structure for userlink.toml.
#[derive(Debug, Deserialize, Default)]
pub struct UserlinkConfig {
    /// Directory snapshot file, relative to the batch root.
    pub directory: Option<String>,
    /// Display-name marker for people the directory no longer knows.
    pub unknown_marker: Option<String>,
    /// Document file extensions to scan.
    pub extensions: Option<Vec<String>>,
    /// Directory names to skip.
    pub exclude: Option<Vec<String>>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl UserlinkConfig {
    /// Whether the report should be printed as JSON.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from userlink.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<UserlinkConfig>> {
    let path = root.join("userlink.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let cfg = toml::from_str(&content).context("Invalid userlink.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg: UserlinkConfig = toml::from_str(
            r#"
            directory = "people.json"
            unknown_marker = "Unknown User"
            extensions = ["xml", "storage"]
            exclude = ["archive"]

            [output]
            format = "JSON"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.directory.as_deref(), Some("people.json"));
        assert_eq!(cfg.extensions.unwrap(), vec!["xml", "storage"]);
        assert_eq!(cfg.exclude.unwrap(), vec!["archive"]);
        assert!(cfg.output.is_some());
    }

    #[test]
    fn test_wants_json() {
        let cfg: UserlinkConfig = toml::from_str("[output]\nformat = \"json\"").unwrap();
        assert!(cfg.wants_json());
        assert!(!UserlinkConfig::default().wants_json());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = std::env::temp_dir().join(format!("userlink_cfg_missing_{}", std::process::id()));
        assert!(load_config(&dir).unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = std::env::temp_dir().join(format!("userlink_cfg_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("userlink.toml"), "extensions = 5").unwrap();

        assert!(load_config(&dir).is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
