#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("invalid difficulty {rows}x{cols}: rows and cols must be at least 1")]
    InvalidDifficulty { rows: u32, cols: u32 },
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("save file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot codec failed: {0}")]
    Codec(String),
    #[error("invalid rules file: {0}")]
    Config(#[from] toml::de::Error),
}

impl PuzzleError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        PuzzleError::MalformedSnapshot(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
