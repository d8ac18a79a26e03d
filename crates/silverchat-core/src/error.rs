use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatCoreError>;

#[derive(Debug, Error)]
pub enum ChatCoreError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid content root: {0}")]
    InvalidContentRoot(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Glob(#[from] globset::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatCoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDocument(_) => "INVALID_DOCUMENT",
            Self::InvalidContentRoot(_) => "INVALID_CONTENT_ROOT",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Walk(_) => "WALK_ERROR",
            Self::Glob(_) => "GLOB_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
