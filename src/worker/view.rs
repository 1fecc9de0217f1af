//! worker/view: read-only окно воркера над общим отображением файла.
//!
//! Отображение (mmap) одно на весь файл и разделяется через Arc; каждое окно
//! держит свою ссылку, так что маппинг живёт, пока жив хотя бы один view.

use std::sync::Arc;

use crate::error::{MstError, Result};

/// Whole-file bytes shared between the reader and its workers
/// (`memmap2::Mmap` in production, a plain buffer in tests).
pub type SharedBytes = Arc<dyn AsRef<[u8]> + Send + Sync>;

pub struct ChunkView {
    bytes: SharedBytes,
    offset: usize,
    len: usize,
}

impl ChunkView {
    /// Window `[offset, offset + len)` of the file. Fails with
    /// `TruncatedDataRegion` when the window does not fit.
    pub fn new(bytes: SharedBytes, offset: u64, len: u64) -> Result<Self> {
        let file_len = (*bytes).as_ref().len() as u64;
        let end = offset.checked_add(len).unwrap_or(u64::MAX);
        if end > file_len {
            return Err(MstError::TruncatedDataRegion {
                offset,
                end,
                file_len,
            });
        }
        Ok(Self {
            bytes,
            offset: offset as usize,
            len: len as usize,
        })
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &(*self.bytes).as_ref()[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
