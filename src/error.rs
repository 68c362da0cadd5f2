use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("chapter index {index} is out of range ({len} chapters available)")]
    ChapterOutOfRange { index: usize, len: usize },
    #[error("failed to write SVG output")]
    Fmt(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
