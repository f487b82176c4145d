use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LottoError {
    #[error("draw number out of range: {0}")]
    NumberOutOfRange(u8),

    #[error("invalid draw date: {0}")]
    InvalidDrawDate(String),

    #[error("parallel arrays disagree: {numbers} winning rows vs {bonuses} bonus entries")]
    ParallelLengthMismatch { numbers: usize, bonuses: usize },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("lottery endpoint client setup failed: {0}")]
    Http(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read draw export at {0}")]
    ImportRead(PathBuf),

    #[error("no draw rows found in the given export files")]
    ImportEmpty,
}
