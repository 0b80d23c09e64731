use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("malformed response from backend: {0}")]
    MalformedResponse(String),

    #[error("stream reported an error: {0}")]
    StreamError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display() {
        let err = RemoteError::Backend { status: 503, body: "down".into() };
        assert_eq!(err.to_string(), "backend returned 503: down");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RemoteError>();
    }
}
