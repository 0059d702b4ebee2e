//! Runtime configuration read from `ILDRISK_*` environment variables.

use std::path::PathBuf;

use crate::adapters::sklearn::{ArtifactDir, DEFAULT_MODEL_FILE, DEFAULT_SCALER_FILE};

/// Default log file for interactive sessions.
pub const DEFAULT_LOG_FILE: &str = "ildrisk.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// File when attached to a terminal, stdout otherwise.
    Auto,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether logs go to a file, given whether stdout is a terminal.
    ///
    /// Writing logs to the terminal would corrupt the TUI's alternate screen.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub scaler_file: String,
    pub model_file: String,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Show full artifact fingerprints on the dashboard instead of short ones.
    pub show_full_fingerprints: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            show_full_fingerprints: false,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).and_then(non_empty);

        Self {
            artifact_dir: get("ILDRISK_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            scaler_file: get("ILDRISK_SCALER_FILE").unwrap_or(defaults.scaler_file),
            model_file: get("ILDRISK_MODEL_FILE").unwrap_or(defaults.model_file),
            log_mode: get("ILDRISK_LOG_MODE")
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: get("ILDRISK_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            show_full_fingerprints: get("ILDRISK_SHOW_FULL_FINGERPRINTS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.show_full_fingerprints),
        }
    }

    /// Artifact source described by this configuration.
    #[must_use]
    pub fn artifact_source(&self) -> ArtifactDir {
        ArtifactDir::with_files(&self.artifact_dir, &self.scaler_file, &self.model_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, AppConfig::default());

        let source = config.artifact_source();
        assert_eq!(source.scaler_path(), PathBuf::from(".").join("rf_scaler.json"));
        assert_eq!(source.model_path(), PathBuf::from(".").join("rf_model.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ILDRISK_ARTIFACT_DIR", "/opt/ildrisk/models"),
            ("ILDRISK_SCALER_FILE", "scaler_v2.json"),
            ("ILDRISK_MODEL_FILE", "forest_v2.json"),
            ("ILDRISK_LOG_MODE", "STDOUT"),
            ("ILDRISK_LOG_FILE", "/tmp/ildrisk.log"),
            ("ILDRISK_SHOW_FULL_FINGERPRINTS", "yes"),
        ]);

        assert_eq!(
            config.artifact_source().model_path(),
            PathBuf::from("/opt/ildrisk/models/forest_v2.json")
        );
        assert_eq!(config.scaler_file, "scaler_v2.json");
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.log_file, PathBuf::from("/tmp/ildrisk.log"));
        assert!(config.show_full_fingerprints);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[("ILDRISK_ARTIFACT_DIR", "  "), ("ILDRISK_LOG_MODE", "")]);
        assert_eq!(config.artifact_dir, PathBuf::from("."));
        assert_eq!(config.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_bool_parsing() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("on"));
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert_eq!(LogMode::parse("unknown"), LogMode::Auto);
    }
}
