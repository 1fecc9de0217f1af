//! plan: разбиение data region на непересекающиеся, выровненные по записи чанки.
//!
//! Чистые функции без I/O: `plan_chunks` и `validate_entries`. Любой вход,
//! который дал бы некорректный диапазон, отклоняется ошибкой (никакого
//! молчаливого clamp).

use serde::Serialize;

use crate::dir::DirEntry;
use crate::error::{MstError, Result};

/// One worker's share of the data region. Offsets are relative to the
/// data-region start; `start` and `len` are multiples of the record length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub start: u64,
    pub len: u64,
    pub first_slot: u64,
    pub slots: u64,
}

impl Chunk {
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Available hardware parallelism (at least 1).
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Split `data_len` bytes of `record_length`-sized slots across at most
/// `workers` chunks. The `records % n` leftover slots go one each to the
/// first chunks, so chunk sizes differ by at most one record; there are never
/// more chunks than whole records and never an empty chunk.
pub fn plan_chunks(data_len: u64, record_length: u32, workers: usize) -> Result<Vec<Chunk>> {
    if record_length == 0 {
        return Err(MstError::InvalidConfig("record length must be > 0".into()));
    }
    if workers == 0 {
        return Err(MstError::InvalidConfig("worker count must be > 0".into()));
    }
    let rl = record_length as u64;
    if data_len % rl != 0 {
        return Err(MstError::InvalidConfig(format!(
            "data region length {} is not a multiple of record length {}",
            data_len, rl
        )));
    }

    let records = data_len / rl;
    if records == 0 {
        return Ok(Vec::new());
    }

    let n = (workers as u64).min(records);
    let per = records / n;
    let rem = records % n;

    let mut chunks = Vec::with_capacity(n as usize);
    let mut first_slot = 0u64;
    for i in 0..n {
        let slots = if i < rem { per + 1 } else { per };
        chunks.push(Chunk {
            index: i as usize,
            start: first_slot * rl,
            len: slots * rl,
            first_slot,
            slots,
        });
        first_slot += slots;
    }
    Ok(chunks)
}

/// Every entry must lie inside the data region and inside a single slot.
pub fn validate_entries(entries: &[DirEntry], data_len: u64, record_length: u32) -> Result<()> {
    let rl = record_length as i64;
    for (index, e) in entries.iter().enumerate() {
        let position = e.position as i64;
        let length = e.length as i64;
        let misaligned = |reason: String| MstError::RecordMisalignment {
            index,
            tag: e.tag,
            position,
            length,
            reason,
        };

        if position < 0 || length < 0 {
            return Err(misaligned("negative position or length".into()));
        }
        if position as u64 >= data_len {
            return Err(misaligned(format!(
                "entry starts at or past data region length {}",
                data_len
            )));
        }
        let end = position + length;
        if end as u64 > data_len {
            return Err(misaligned(format!(
                "entry ends at {} past data region length {}",
                end, data_len
            )));
        }
        if length > 0 && rl > 0 && position / rl != (end - 1) / rl {
            return Err(misaligned(format!(
                "entry crosses record boundary at {}",
                (position / rl + 1) * rl
            )));
        }
    }
    Ok(())
}
