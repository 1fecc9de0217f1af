//! reader/merge: барьер и склейка результатов воркеров.
//!
//! На вход приходят результаты ВСЕХ чанков (join уже выполнен), в порядке
//! индекса чанка. Поля склеиваются по индексу чанка, не по порядку завершения.

use crate::document::Field;
use crate::error::{MstError, Result};
use crate::metrics;
use crate::plan::Chunk;
use crate::worker::ChunkOutput;

/// Merge chunk results. The first real failure (lowest chunk index) wins over
/// cancellations; if every failure is a cancellation the first one is returned.
pub fn aggregate(results: Vec<(Chunk, Result<ChunkOutput>)>, base_address: u64) -> Result<Vec<Field>> {
    let mut first_cancel: Option<MstError> = None;
    let mut failure: Option<(Chunk, MstError)> = None;
    let mut outputs = Vec::with_capacity(results.len());

    for (chunk, res) in results {
        match res {
            Ok(out) => outputs.push(out),
            Err(e @ MstError::Cancelled { .. }) => {
                if first_cancel.is_none() {
                    first_cancel = Some(e);
                }
            }
            Err(e) => {
                metrics::record_worker_failure();
                if failure.is_none() {
                    failure = Some((chunk, e));
                }
            }
        }
    }

    if let Some((chunk, e)) = failure {
        return Err(MstError::WorkerFailure {
            chunk: chunk.index,
            offset: base_address + chunk.start,
            source: Box::new(e),
        });
    }
    if let Some(e) = first_cancel {
        return Err(e);
    }

    outputs.sort_by_key(|o| o.chunk.index);
    let total: usize = outputs.iter().map(|o| o.fields.len()).sum();
    let mut fields = Vec::with_capacity(total);
    for out in outputs {
        fields.extend(out.fields);
    }
    Ok(fields)
}
