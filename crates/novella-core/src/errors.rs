use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Asset not found: {}", .0.display())]
    AssetNotFound(PathBuf),
    #[error("Failed to open decoder for {}: {reason}", path.display())]
    DecodeInit { path: PathBuf, reason: String },
    #[error("Invalid scene script: {0}")]
    InvalidScript(String),
    #[error("Invalid story: {0}")]
    InvalidStory(String),
    #[error("Display error: {0}")]
    Display(String),
    #[error("Failed to create surface")]
    SurfaceFailure,
    /// Raised by every poll point when the user closes the player.
    #[error("Quit requested")]
    Quit,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PlayerError {
    pub fn decode_init(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DecodeInit {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the user-initiated quit signal, which is not a failure.
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}
