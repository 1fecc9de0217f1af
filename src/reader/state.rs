//! Состояния одного чтения master-файла.

use std::fmt;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Unopened,
    HeaderRead,
    DirectoryRead,
    /// Workers are running over `chunks` planned chunks.
    Decoding { chunks: usize },
    Decoded,
    ControlRead,
    Ready,
    Failed(ErrorKind),
}

impl ReadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadState::Ready | ReadState::Failed(_))
    }
}

impl fmt::Display for ReadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadState::Unopened => write!(f, "unopened"),
            ReadState::HeaderRead => write!(f, "header-read"),
            ReadState::DirectoryRead => write!(f, "directory-read"),
            ReadState::Decoding { chunks } => write!(f, "decoding({} chunk(s))", chunks),
            ReadState::Decoded => write!(f, "decoded"),
            ReadState::ControlRead => write!(f, "control-read"),
            ReadState::Ready => write!(f, "ready"),
            ReadState::Failed(kind) => write!(f, "failed({:?})", kind),
        }
    }
}
