//! worker: декодирование одного чанка data region.
//!
//! Разделение по подмодулям:
//! - cancel.rs: CancelToken (общий флаг кооперативной отмены).
//! - view.rs  : ChunkView: read-only окно над общим mmap.
//! - mod.rs   : decode_chunk + RecordInspector.
//!
//! Воркер ничего не пишет в общие структуры: результат это собственный
//! `Vec<Field>` чанка, который забирает aggregator.

pub mod cancel;
pub mod view;

pub use cancel::CancelToken;
pub use view::{ChunkView, SharedBytes};

use std::sync::Arc;

use log::trace;

use crate::dir::Directory;
use crate::document::Field;
use crate::error::{MstError, Result};
use crate::metrics;
use crate::plan::Chunk;

/// Per-record hook run by workers before the record's fields are extracted.
/// Returning an error fails the chunk (and with it the whole document).
///
/// `cancel` is the read's own flag: a slow inspector may poll it and return
/// early once a sibling chunk has failed.
pub trait RecordInspector: Send + Sync {
    fn inspect(&self, chunk: &Chunk, slot: u64, record: &[u8], cancel: &CancelToken) -> Result<()>;
}

/// Everything a worker borrows from the reader for the duration of a read.
pub struct WorkerContext<'a> {
    pub bytes: &'a SharedBytes,
    pub base_address: u64,
    pub record_length: u32,
    pub directory: &'a Directory,
    pub cancel: &'a CancelToken,
    pub inspector: Option<&'a dyn RecordInspector>,
}

/// Chunk-local result handed to the aggregator.
#[derive(Debug)]
pub struct ChunkOutput {
    pub chunk: Chunk,
    pub fields: Vec<Field>,
    pub records: u64,
}

/// Decode every record of `chunk`. On failure the shared cancel flag is
/// raised before the error is returned.
pub fn decode_chunk(ctx: &WorkerContext<'_>, chunk: Chunk) -> Result<ChunkOutput> {
    let res = decode_chunk_inner(ctx, chunk);
    if let Err(e) = &res {
        if !matches!(e, MstError::Cancelled { .. }) {
            ctx.cancel.cancel();
        }
    }
    res
}

fn decode_chunk_inner(ctx: &WorkerContext<'_>, chunk: Chunk) -> Result<ChunkOutput> {
    let view = ChunkView::new(
        Arc::clone(ctx.bytes),
        ctx.base_address + chunk.start,
        chunk.len,
    )?;
    let data = view.as_slice();
    let rl = ctx.record_length as u64;

    let mut fields = Vec::new();
    let mut records = 0u64;
    let mut bytes = 0u64;

    for k in 0..chunk.slots {
        if ctx.cancel.is_cancelled() {
            trace!("chunk {}: cancelled after {} record(s)", chunk.index, records);
            metrics::record_worker_cancelled();
            return Err(MstError::Cancelled {
                chunk: chunk.index,
                records_done: records,
            });
        }

        let slot = chunk.first_slot + k;
        let rel = (k * rl) as usize;
        let record = &data[rel..rel + rl as usize];

        if let Some(insp) = ctx.inspector {
            insp.inspect(&chunk, slot, record, ctx.cancel)?;
        }

        let slot_start = slot * rl;
        let slot_end = slot_start + rl;
        for (index, e) in ctx.directory.entries_in(slot_start, slot_end) {
            // cross-check: запись каталога должна целиком лежать в этом слоте
            let in_slot = e.position as i64 - slot_start as i64;
            let end = in_slot + e.length as i64;
            if in_slot < 0 || e.length < 0 || end > rl as i64 {
                return Err(MstError::RecordMisalignment {
                    index,
                    tag: e.tag,
                    position: e.position as i64,
                    length: e.length as i64,
                    reason: format!("does not fit record slot {} ({}..{})", slot, slot_start, slot_end),
                });
            }
            let payload = record[in_slot as usize..end as usize].to_vec();
            bytes += payload.len() as u64;
            fields.push(Field {
                tag: e.tag,
                index,
                slot,
                position: e.position as u64,
                payload,
            });
        }
        records += 1;
    }

    metrics::record_chunk_decoded(records, bytes);
    trace!(
        "chunk {}: {} record(s), {} field(s), {} payload byte(s)",
        chunk.index,
        records,
        fields.len(),
        bytes
    );
    Ok(ChunkOutput {
        chunk,
        fields,
        records,
    })
}
