#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("failed to read batch config {path}: {message}")]
    ConfigRead { path: String, message: String },

    #[error("invalid batch config {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("query column '{0}' not found; available columns: {1}")]
    MissingQueryColumn(String, String),

    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_query_column_lists_available() {
        let err = BatchError::MissingQueryColumn("prompt".into(), "id, text".into());
        assert_eq!(err.to_string(), "query column 'prompt' not found; available columns: id, text");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BatchError>();
    }
}
