#[derive(thiserror::Error, Debug)]
pub enum ExecutorError {
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("swarm builder failed for '{name}': {message}")]
    BuildFailed { name: String, message: String },

    #[error(transparent)]
    Remote(#[from] aworld_remote::RemoteError),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = ExecutorError::AgentNotFound("weather".into());
        assert_eq!(err.to_string(), "agent not found: weather");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExecutorError>();
    }
}
