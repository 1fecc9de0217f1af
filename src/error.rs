//! Typed errors of the master-file reader.
//!
//! Every variant is fatal to the document being read; the reader never
//! returns a partially decoded `Document`.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`MstError`], used by `ReadState::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    MalformedHeader,
    TruncatedDirectory,
    TruncatedDataRegion,
    RecordMisalignment,
    TruncatedControlRecord,
    ControlMismatch,
    WorkerFailure,
    WorkerPanic,
    Cancelled,
    InvalidConfig,
}

#[derive(Debug, Error)]
pub enum MstError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed leader at offset {offset}: {reason}")]
    MalformedHeader { offset: u64, reason: String },

    #[error("truncated directory: need {expected} bytes, file has {actual}")]
    TruncatedDirectory { expected: u64, actual: u64 },

    #[error("truncated data region: range {offset}..{end} exceeds file length {file_len}")]
    TruncatedDataRegion { offset: u64, end: u64, file_len: u64 },

    #[error("record misalignment at data offset {position}: {reason} (entry #{index}, tag {tag}, len {length})")]
    RecordMisalignment {
        index: usize,
        tag: i32,
        position: i64,
        length: i64,
        reason: String,
    },

    #[error("truncated control record at offset {offset}: need {expected} bytes, {actual} remain")]
    TruncatedControlRecord { offset: u64, expected: u64, actual: u64 },

    #[error("control record count {control} does not match leader record count {leader}")]
    ControlMismatch { leader: u64, control: u64 },

    #[error("worker for chunk {chunk} (file offset {offset}) failed: {source}")]
    WorkerFailure {
        chunk: usize,
        offset: u64,
        #[source]
        source: Box<MstError>,
    },

    #[error("worker for chunk {chunk} panicked: {message}")]
    WorkerPanic { chunk: usize, message: String },

    #[error("chunk {chunk} cancelled after {records_done} record(s)")]
    Cancelled { chunk: usize, records_done: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MstError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MstError::Io { .. } => ErrorKind::Io,
            MstError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            MstError::TruncatedDirectory { .. } => ErrorKind::TruncatedDirectory,
            MstError::TruncatedDataRegion { .. } => ErrorKind::TruncatedDataRegion,
            MstError::RecordMisalignment { .. } => ErrorKind::RecordMisalignment,
            MstError::TruncatedControlRecord { .. } => ErrorKind::TruncatedControlRecord,
            MstError::ControlMismatch { .. } => ErrorKind::ControlMismatch,
            MstError::WorkerFailure { .. } => ErrorKind::WorkerFailure,
            MstError::WorkerPanic { .. } => ErrorKind::WorkerPanic,
            MstError::Cancelled { .. } => ErrorKind::Cancelled,
            MstError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Error of the failing chunk for `WorkerFailure`, otherwise `self`.
    pub fn root_cause(&self) -> &MstError {
        match self {
            MstError::WorkerFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MstError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        MstError::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MstError>;
