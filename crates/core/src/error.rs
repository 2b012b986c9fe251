use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{path} returned status {status}")]
    Status { path: String, status: u16 },

    #[error("html parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("unsupported attachment: {0}")]
    UnsupportedAttachment(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
