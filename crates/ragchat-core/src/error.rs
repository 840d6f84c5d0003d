use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors raised while talking to the gateway or the model service.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The remote end could not be reached
    #[error("cannot connect to {url}: {message}")]
    Connection { url: String, message: String },

    /// The request did not complete within the configured timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The remote end answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be decoded
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The remote end reported an error in its body
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Classifies a transport error from `reqwest` for the given url.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            ChatError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            ChatError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            ChatError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
