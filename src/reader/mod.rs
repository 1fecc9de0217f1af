//! reader: полный цикл чтения master-файла.
//!
//! open RO + mmap → leader → directory → plan → воркеры (по одному на чанк)
//! → join всех → merge по индексу чанка → control record → Document.
//!
//! Mmap разделяется воркерами через Arc и вместе с shared-lock освобождается
//! только после merge и чтения control record, на любом пути выхода.

pub mod merge;
pub mod state;

pub use state::ReadState;

use log::{debug, info};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::config::{ReaderBuilder, ReaderConfig};
use crate::consts::LEADER_SIZE;
use crate::control::decode_control;
use crate::dir::{decode_directory, Directory};
use crate::document::Document;
use crate::error::{MstError, Result};
use crate::leader::{decode_leader, Leader};
use crate::lock::acquire_shared_lock;
use crate::metrics;
use crate::plan::{plan_chunks, validate_entries, Chunk};
use crate::worker::{
    decode_chunk, CancelToken, ChunkOutput, RecordInspector, SharedBytes, WorkerContext,
};

pub struct MstReader {
    path: PathBuf,
    cfg: ReaderConfig,
    inspector: Option<Arc<dyn RecordInspector>>,
    cancel: Option<CancelToken>,
    state: ReadState,
}

impl MstReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(path, ReaderConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, cfg: ReaderConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cfg,
            inspector: None,
            cancel: None,
            state: ReadState::Unopened,
        }
    }

    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn RecordInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Use a caller-owned token. Cancelling it stops a read in progress;
    /// a token stays cancelled once set. The reader never cancels it itself:
    /// failures raise a per-read child token only.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.cfg
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Read and decode the whole file. Either every chunk decodes and a full
    /// `Document` is returned, or an error is returned and nothing else.
    pub fn read(&mut self) -> Result<Document> {
        self.state = ReadState::Unopened;
        // свой флаг на каждое чтение; токен вызывающего только наблюдается
        let cancel = match &self.cancel {
            Some(external) => external.child(),
            None => CancelToken::new(),
        };

        let res = match self.read_inner(&cancel) {
            Ok(doc) => {
                self.transition(ReadState::Ready);
                metrics::record_document_read();
                info!(
                    "{}: {} record(s), {} field(s), {} payload byte(s)",
                    self.path.display(),
                    doc.leader.record_count,
                    doc.fields.len(),
                    doc.payload_bytes()
                );
                Ok(doc)
            }
            Err(e) => {
                cancel.cancel();
                self.transition(ReadState::Failed(e.kind()));
                metrics::record_document_failed();
                Err(e)
            }
        };
        debug_assert!(self.state.is_terminal(), "read ended in {}", self.state);
        res
    }

    fn transition(&mut self, next: ReadState) {
        debug!("{}: {} -> {}", self.path.display(), self.state, next);
        self.state = next;
    }

    fn read_inner(&mut self, cancel: &CancelToken) -> Result<Document> {
        let file = File::open(&self.path).map_err(|e| MstError::io(&self.path, e))?;
        let _lock = if self.cfg.shared_lock {
            Some(acquire_shared_lock(&file, &self.path)?)
        } else {
            None
        };

        let file_len = file
            .metadata()
            .map_err(|e| MstError::io(&self.path, e))?
            .len();
        if file_len < LEADER_SIZE as u64 {
            return Err(MstError::malformed(
                0,
                format!("file is {} byte(s), leader needs {}", file_len, LEADER_SIZE),
            ));
        }

        // Мапим весь файл RO, offset=0 (page-aligned).
        let map = unsafe {
            MmapOptions::new()
                .offset(0)
                .len(file_len as usize)
                .map(&file)
                .map_err(|e| MstError::io(&self.path, e))?
        };
        let bytes: SharedBytes = Arc::new(map);

        self.decode_mapped(&bytes, cancel)
    }

    fn decode_mapped(&mut self, bytes: &SharedBytes, cancel: &CancelToken) -> Result<Document> {
        let buf: &[u8] = (**bytes).as_ref();
        let file_len = buf.len() as u64;

        let leader = decode_leader(buf)?;
        self.transition(ReadState::HeaderRead);

        let directory = decode_directory(buf, &leader)?;
        self.transition(ReadState::DirectoryRead);

        validate_entries(&directory.entries, leader.data_len, leader.record_length)?;
        let chunks = plan_chunks(
            leader.data_len,
            leader.record_length,
            self.cfg.effective_workers(),
        )?;
        for c in &chunks {
            let end = leader.base_address + c.end();
            if end > file_len {
                return Err(MstError::TruncatedDataRegion {
                    offset: leader.base_address + c.start,
                    end,
                    file_len,
                });
            }
        }

        self.transition(ReadState::Decoding {
            chunks: chunks.len(),
        });
        let inspector = self.inspector.clone();
        let results = run_workers(
            &self.path,
            bytes,
            &leader,
            &directory,
            &chunks,
            cancel,
            inspector.as_deref(),
        );
        let fields = merge::aggregate(results, leader.base_address)?;
        self.transition(ReadState::Decoded);

        let control = decode_control(buf, leader.data_end())?;
        self.transition(ReadState::ControlRead);

        if self.cfg.verify_control {
            let counted = control.record_count as u32 as u64;
            if counted != leader.record_count {
                return Err(MstError::ControlMismatch {
                    leader: leader.record_count,
                    control: counted,
                });
            }
        }

        Ok(Document {
            leader,
            fields,
            control,
        })
    }
}

/// Read `path` with configuration taken from the environment.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    MstReader::with_config(path, ReaderConfig::from_env()).read()
}

// Поднимает флаг отмены, если воркер паникует, чтобы соседи не досчитывали зря.
struct CancelOnPanic<'a>(&'a CancelToken);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.cancel();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// One scoped thread per chunk; returns after ALL of them have been joined,
/// results in chunk-index order.
fn run_workers(
    path: &Path,
    bytes: &SharedBytes,
    leader: &Leader,
    directory: &Directory,
    chunks: &[Chunk],
    cancel: &CancelToken,
    inspector: Option<&dyn RecordInspector>,
) -> Vec<(Chunk, Result<ChunkOutput>)> {
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(chunks.len());
        for &chunk in chunks {
            let ctx = WorkerContext {
                bytes,
                base_address: leader.base_address,
                record_length: leader.record_length,
                directory,
                cancel,
                inspector,
            };
            let spawned = thread::Builder::new()
                .name(format!("mst-worker-{}", chunk.index))
                .spawn_scoped(s, move || {
                    let _guard = CancelOnPanic(ctx.cancel);
                    decode_chunk(&ctx, chunk)
                });
            match spawned {
                Ok(h) => handles.push((chunk, Ok(h))),
                Err(e) => {
                    cancel.cancel();
                    handles.push((chunk, Err(MstError::io(path, e))));
                }
            }
        }

        handles
            .into_iter()
            .map(|(chunk, h)| {
                let res = match h {
                    Ok(h) => match h.join() {
                        Ok(res) => res,
                        Err(payload) => Err(MstError::WorkerPanic {
                            chunk: chunk.index,
                            message: panic_message(payload.as_ref()),
                        }),
                    },
                    Err(e) => Err(e),
                };
                (chunk, res)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::DirEntry;
    use crate::error::ErrorKind;
    use crate::leader::decode_leader;
    use byteorder::{ByteOrder, LittleEndian};

    // leader + каталог + data + control в одном буфере (canonical layout)
    fn image(rl: i32, records: i32, entries: &[(i32, i32, i32)]) -> Vec<u8> {
        let n = entries.len();
        let base = 32 + 12 * n;
        let data_len = (rl * records) as usize;
        let mut b = vec![0u8; base + data_len + 36];
        LittleEndian::write_i32(&mut b[4..8], rl);
        LittleEndian::write_i32(&mut b[8..12], records);
        LittleEndian::write_i32(&mut b[16..20], base as i32);
        LittleEndian::write_i32(&mut b[20..24], n as i32);
        for (i, (t, p, l)) in entries.iter().enumerate() {
            let off = 32 + 12 * i;
            LittleEndian::write_i32(&mut b[off..], *t);
            LittleEndian::write_i32(&mut b[off + 4..], *p);
            LittleEndian::write_i32(&mut b[off + 8..], *l);
        }
        for i in 0..data_len {
            b[base + i] = (i % 251) as u8;
        }
        LittleEndian::write_i32(&mut b[base + data_len + 20..], records);
        b
    }

    #[test]
    fn run_workers_keeps_chunk_order_and_joins_all() {
        let img = image(10, 8, &[(1, 0, 4), (2, 35, 5), (3, 79, 1)]);
        let leader = decode_leader(&img).unwrap();
        let dir = decode_directory(&img, &leader).unwrap();
        let bytes: SharedBytes = Arc::new(img);
        let chunks = plan_chunks(leader.data_len, leader.record_length, 3).unwrap();
        let cancel = CancelToken::new();

        let results = run_workers(
            Path::new("mem"),
            &bytes,
            &leader,
            &dir,
            &chunks,
            &cancel,
            None,
        );
        assert_eq!(results.len(), 3);
        for (i, (c, r)) in results.iter().enumerate() {
            assert_eq!(c.index, i);
            assert!(r.is_ok());
        }
        // все view отпущены после join
        assert_eq!(Arc::strong_count(&bytes), 1);

        let fields = merge::aggregate(results, leader.base_address).unwrap();
        let tags: Vec<i32> = fields.iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    struct Panicky;

    impl RecordInspector for Panicky {
        fn inspect(&self, chunk: &Chunk, _slot: u64, _record: &[u8], _cancel: &CancelToken) -> Result<()> {
            if chunk.index == 1 {
                panic!("inspector exploded");
            }
            Ok(())
        }
    }

    #[test]
    fn worker_panic_becomes_error_and_cancels() {
        let img = image(10, 4, &[(1, 0, 4)]);
        let leader = decode_leader(&img).unwrap();
        let dir = Directory::new(vec![DirEntry { tag: 1, position: 0, length: 4 }]);
        let bytes: SharedBytes = Arc::new(img);
        let chunks = plan_chunks(leader.data_len, leader.record_length, 2).unwrap();
        let cancel = CancelToken::new();

        let results = run_workers(
            Path::new("mem"),
            &bytes,
            &leader,
            &dir,
            &chunks,
            &cancel,
            Some(&Panicky),
        );
        assert!(cancel.is_cancelled());
        let err = merge::aggregate(results, leader.base_address).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WorkerFailure);
        assert_eq!(err.root_cause().kind(), ErrorKind::WorkerPanic);
    }
}
