use crate::cue::error::CueError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KhnError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    ProgressTemplateError(#[from] indicatif::style::TemplateError),

    #[error("Table of contents is {0} bytes and does not fit below offset 0x400")]
    TocTooLarge(usize),

    #[error("Track number {0} cannot be encoded as two BCD digits")]
    TrackNumberOutOfRange(u8),

    #[error("Sector {0} lies past 99:59:74 and cannot be addressed")]
    AddressOutOfRange(u64),

    #[error("Output file already exists, use --force to overwrite: {0}")]
    OutputAlreadyExists(PathBuf),

    #[error("No CUE files found in: {0}")]
    NoCueFilesFound(PathBuf),

    #[error("Conversion was cancelled")]
    Cancelled,
}

pub type KhnResult<T> = Result<T, KhnError>;
