use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubliveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubliveError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        SubliveError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubliveError>;
