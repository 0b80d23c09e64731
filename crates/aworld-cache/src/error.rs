use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("not a recognized git reference: {0}")]
    InvalidReference(String),

    #[error("git {operation} failed in {path}: {stderr}")]
    GitCommandFailed {
        operation: &'static str,
        path: PathBuf,
        stderr: String,
    },

    #[error("git {operation} timed out after {seconds}s in {path}")]
    Timeout {
        operation: &'static str,
        path: PathBuf,
        seconds: u64,
    },

    #[error("plugin '{0}' is not installed")]
    PluginNotFound(String),

    #[error("plugin '{0}' is already installed (pass force to reinstall)")]
    PluginAlreadyInstalled(String),

    #[error("failed to read manifest at {path}: {message}")]
    ManifestRead { path: PathBuf, message: String },

    #[error("failed to write manifest at {path}: {message}")]
    ManifestWrite { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lock(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_reference() {
        let err = CacheError::InvalidReference("not-a-url".into());
        assert_eq!(err.to_string(), "not a recognized git reference: not-a-url");
    }

    #[test]
    fn display_plugin_not_found() {
        let err = CacheError::PluginNotFound("demo".into());
        assert_eq!(err.to_string(), "plugin 'demo' is not installed");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CacheError>();
    }
}
