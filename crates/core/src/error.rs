#[derive(Debug, thiserror::Error)]
pub enum DeeplinkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("navigation to {path} failed: {reason}")]
    Navigation { path: String, reason: String },
    #[error("navigator panicked while opening {path}")]
    NavigationPanicked { path: String },
    #[error("failed to serialise link data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeeplinkError {
    /// Convenience constructor for navigator implementations.
    pub fn navigation(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Navigation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type DeeplinkResult<T> = std::result::Result<T, DeeplinkError>;
