#![allow(non_snake_case)]

// Формат
pub mod consts;
pub mod error;
pub mod leader;
pub mod dir;
pub mod control;

// Параллельное чтение
pub mod plan;
pub mod worker;
pub mod reader;
pub mod document;

// Окружение
pub mod config;
pub mod lock;
pub mod metrics;
pub mod util;
pub mod cli;

// Удобные реэкспорты
pub use config::{ReaderBuilder, ReaderConfig};
pub use control::{decode_control, ControlRecord, NextVolume};
pub use dir::{decode_directory, DirEntry, Directory};
pub use document::{Document, Field};
pub use error::{ErrorKind, MstError, Result};
pub use leader::{decode_leader, Leader};
pub use lock::{acquire_shared_lock, try_acquire_shared_lock, SharedLockGuard};
pub use plan::{default_workers, plan_chunks, validate_entries, Chunk};
pub use reader::{read_document, MstReader, ReadState};
pub use worker::{CancelToken, RecordInspector};
