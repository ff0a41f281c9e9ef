//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// JSON-lines manifest of decoded replays to sample
    pub manifest_path: PathBuf,
    /// Directory the sample streams are written to
    pub dataset_root: PathBuf,
    /// File name of the physics stream
    pub physics_file: String,
    /// File name of the control stream
    pub controls_file: String,
    /// Replays parsed at the same time
    pub max_parallel_parses: usize,
    /// Frames buffered between the JSON reader and the parser
    pub frame_buffer: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &'static str, default: usize| -> Result<usize, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::Invalid(key)),
                None => Ok(default),
            }
        };

        Ok(Self {
            manifest_path: lookup("MANIFEST_PATH")
                .map(PathBuf::from)
                .ok_or(ConfigError::Missing("MANIFEST_PATH"))?,
            dataset_root: lookup("DATASET_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("dataset")),
            physics_file: lookup("PHYSICS_FILE").unwrap_or_else(|| "inputs".to_string()),
            controls_file: lookup("CONTROLS_FILE").unwrap_or_else(|| "outputs".to_string()),
            max_parallel_parses: number("MAX_PARALLEL_PARSES", 6)?,
            frame_buffer: number("FRAME_BUFFER", 64)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn physics_path(&self) -> PathBuf {
        self.dataset_root.join(&self.physics_file)
    }

    pub fn controls_path(&self) -> PathBuf {
        self.dataset_root.join(&self.controls_file)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0} (expected a positive integer)")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("MANIFEST_PATH", "jobs.jsonl")])).unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("jobs.jsonl"));
        assert_eq!(config.physics_path(), PathBuf::from("dataset").join("inputs"));
        assert_eq!(config.controls_path(), PathBuf::from("dataset").join("outputs"));
        assert_eq!(config.max_parallel_parses, 6);
        assert_eq!(config.frame_buffer, 64);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn manifest_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MANIFEST_PATH")));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[
            ("MANIFEST_PATH", "jobs.jsonl"),
            ("MAX_PARALLEL_PARSES", "zero"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("MAX_PARALLEL_PARSES")));

        let err = Config::from_lookup(lookup(&[
            ("MANIFEST_PATH", "jobs.jsonl"),
            ("FRAME_BUFFER", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("FRAME_BUFFER")));
    }
}
