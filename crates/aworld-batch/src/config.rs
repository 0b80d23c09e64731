//! YAML batch job configuration, matching the on-disk layout documented for
//! `batch-job <config.yaml>`.

use crate::error::{BatchError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_parallel() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub path: PathBuf,
    pub query_column: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub remote_backend: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default)]
    pub max_retries: usize,
    #[serde(default)]
    pub timeout_per_task: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            max_retries: 0,
            timeout_per_task: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestLogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub input: InputConfig,
    pub agent: AgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub digest_log: Option<DigestLogConfig>,
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BatchError::ConfigRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&contents).map_err(|e| BatchError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        std::fs::write(
            &path,
            "input:\n  path: in.csv\n  query_column: query\nagent:\n  name: weather\noutput:\n  path: out.csv\n",
        )
        .unwrap();

        let config = BatchConfig::load(&path).unwrap();
        assert_eq!(config.execution.parallel, 1);
        assert_eq!(config.input.encoding, "utf-8");
        assert_eq!(config.input.delimiter, ',');
        assert!(config.digest_log.is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        std::fs::write(&path, "agent:\n  name: weather\noutput:\n  path: out.csv\n").unwrap();

        let result = BatchConfig::load(&path);
        assert!(matches!(result, Err(BatchError::ConfigParse { .. })));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        std::fs::write(
            &path,
            "input:\n  path: in.csv\n  query_column: query\nagent:\n  name: weather\noutput:\n  path: out.csv\nnotes: ignored\n",
        )
        .unwrap();

        assert!(BatchConfig::load(&path).is_ok());
    }
}
