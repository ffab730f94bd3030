use thiserror::Error;

/// Errors raised while talking to a remote source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Any non-2xx response.
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body arrived but is not the expected shape.
    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("I/O error while saving {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            SourceError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            SourceError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Network failures and non-2xx responses are worth another attempt;
    /// malformed bodies and local I/O failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Transport { .. } | SourceError::Timeout { .. } | SourceError::Status { .. }
        )
    }
}
