use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Invalid CUE sheet: {0}")]
    FormatError(String),

    #[error("Referenced file is missing from the CUE sheet directory: {0}")]
    SourceMissingError(String),
}

pub type CueResult<T> = Result<T, CueError>;
