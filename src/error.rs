//! Error type for configuration loading and file watching.
//!
//! Generation itself never fails: missing collaborators and exhausted
//! placement attempts degrade to less content and are reported, not raised.

/// Error type for settings and hot-reload operations
#[derive(Debug, thiserror::Error)]
pub enum ProcgenError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Settings parse error: {0}")]
    Parse(String),
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl From<ron::error::SpannedError> for ProcgenError {
    fn from(e: ron::error::SpannedError) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ProcgenError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
