use std::{fmt, path::PathBuf};

use thiserror::Error;

use super::records::RecordId;

#[derive(Debug, Error)]
pub enum StdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an STDF container: {}", .path.display())]
    NotAContainer { path: PathBuf },

    #[error("malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("part already open for head {head}, site {site} (part {part})")]
    ReentrantPartOpen { head: i8, site: i8, part: u32 },

    #[error("{record} record for head {head}, site {site} with no open part")]
    UnmatchedPartRecord {
        record: RecordId,
        head: i8,
        site: i8,
    },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, StdfError>;

impl StdfError {
    pub fn not_a_container(path: impl Into<PathBuf>) -> Self {
        Self::NotAContainer { path: path.into() }
    }

    pub fn malformed(offset: u64, reason: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            offset,
            reason: reason.to_string(),
        }
    }

    pub fn internal(details: impl fmt::Display) -> Self {
        Self::InternalInvariant(details.to_string())
    }
}
