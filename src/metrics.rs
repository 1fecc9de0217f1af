//! Lightweight global metrics for the reader.
//!
//! Потокобезопасные атомарные счётчики (Relaxed): документы, записи, байты
//! payload, упавшие и отменённые воркеры.

use std::sync::atomic::{AtomicU64, Ordering};

static DOCUMENTS_READ: AtomicU64 = AtomicU64::new(0);
static DOCUMENTS_FAILED: AtomicU64 = AtomicU64::new(0);
static RECORDS_DECODED: AtomicU64 = AtomicU64::new(0);
static PAYLOAD_BYTES_DECODED: AtomicU64 = AtomicU64::new(0);
static CHUNKS_DECODED: AtomicU64 = AtomicU64::new(0);
static WORKER_FAILURES: AtomicU64 = AtomicU64::new(0);
static WORKERS_CANCELLED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub documents_read: u64,
    pub documents_failed: u64,
    pub records_decoded: u64,
    pub payload_bytes_decoded: u64,
    pub chunks_decoded: u64,
    pub worker_failures: u64,
    pub workers_cancelled: u64,
}

impl MetricsSnapshot {
    pub fn avg_records_per_chunk(&self) -> f64 {
        if self.chunks_decoded == 0 {
            0.0
        } else {
            self.records_decoded as f64 / self.chunks_decoded as f64
        }
    }
}

// ----- Recorders -----
pub fn record_document_read() {
    DOCUMENTS_READ.fetch_add(1, Ordering::Relaxed);
}

pub fn record_document_failed() {
    DOCUMENTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_chunk_decoded(records: u64, payload_bytes: u64) {
    CHUNKS_DECODED.fetch_add(1, Ordering::Relaxed);
    RECORDS_DECODED.fetch_add(records, Ordering::Relaxed);
    PAYLOAD_BYTES_DECODED.fetch_add(payload_bytes, Ordering::Relaxed);
}

pub fn record_worker_failure() {
    WORKER_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_worker_cancelled() {
    WORKERS_CANCELLED.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        documents_read: DOCUMENTS_READ.load(Ordering::Relaxed),
        documents_failed: DOCUMENTS_FAILED.load(Ordering::Relaxed),
        records_decoded: RECORDS_DECODED.load(Ordering::Relaxed),
        payload_bytes_decoded: PAYLOAD_BYTES_DECODED.load(Ordering::Relaxed),
        chunks_decoded: CHUNKS_DECODED.load(Ordering::Relaxed),
        worker_failures: WORKER_FAILURES.load(Ordering::Relaxed),
        workers_cancelled: WORKERS_CANCELLED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    DOCUMENTS_READ.store(0, Ordering::Relaxed);
    DOCUMENTS_FAILED.store(0, Ordering::Relaxed);
    RECORDS_DECODED.store(0, Ordering::Relaxed);
    PAYLOAD_BYTES_DECODED.store(0, Ordering::Relaxed);
    CHUNKS_DECODED.store(0, Ordering::Relaxed);
    WORKER_FAILURES.store(0, Ordering::Relaxed);
    WORKERS_CANCELLED.store(0, Ordering::Relaxed);
}
