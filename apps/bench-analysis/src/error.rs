use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("workbook not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("malformed workbook {}: {reason}", path.display())]
    MalformedWorkbook { path: PathBuf, reason: String },
    #[error("failed to open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
}

impl ExtractError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedWorkbook {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::MalformedWorkbook { path, .. }
            | Self::Open { path, .. } => path,
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
