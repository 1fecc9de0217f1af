// tests/lock_and_config.rs
//
// Shared-lock совместим с другими читателями; конфиг и builder
// доходят до reader'а; метрики считают документы.

mod common;

use std::fs::{self, File};

use anyhow::Result;

use IrbisMst::metrics;
use IrbisMst::{
    read_document, try_acquire_shared_lock, MstReader, ReadState, ReaderBuilder, ReaderConfig,
};

use common::{unique_path, MstImage};

#[test]
fn read_while_another_reader_holds_shared_lock() -> Result<()> {
    let img = MstImage::with_records(40, 10, 16);
    let path = unique_path("lock");
    img.write_to(&path)?;

    let f = File::open(&path)?;
    let guard = try_acquire_shared_lock(&f, &path)?;
    assert_eq!(guard.path(), path.as_path());

    let mut r = MstReader::with_config(&path, ReaderConfig::default().with_shared_lock(true));
    let doc = r.read()?;
    assert_eq!(doc.fields.len(), 10);
    assert_eq!(r.state(), ReadState::Ready);

    drop(guard);
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn read_document_and_builder_agree() -> Result<()> {
    let img = MstImage::with_records(40, 33, 30);
    let path = unique_path("builder");
    img.write_to(&path)?;

    let a = read_document(&path)?;
    let b = ReaderBuilder::from_default()
        .workers(5)
        .shared_lock(false)
        .open(&path)
        .read()?;
    assert_eq!(a.fields, b.fields);
    assert_eq!(a.checksum(), b.checksum());

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn reader_is_reusable_and_reports_config() -> Result<()> {
    let img = MstImage::with_records(8, 12, 8);
    let path = unique_path("reuse");
    img.write_to(&path)?;

    let mut r = MstReader::builder().workers(3).open(&path);
    assert_eq!(r.state(), ReadState::Unopened);
    assert_eq!(r.config().effective_workers(), 3);
    assert_eq!(r.path(), path.as_path());

    let first = r.read()?;
    let second = r.read()?;
    assert_eq!(first, second);
    assert_eq!(r.state(), ReadState::Ready);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn metrics_count_documents_and_records() -> Result<()> {
    let img = MstImage::with_records(16, 20, 4);
    let path = unique_path("metrics");
    img.write_to(&path)?;

    // счётчики глобальные и тесты идут параллельно: проверяем только прирост
    let before = metrics::snapshot();
    MstReader::with_config(&path, ReaderConfig::default().with_workers(Some(4))).read()?;
    let after = metrics::snapshot();
    assert!(after.documents_read >= before.documents_read + 1);
    assert!(after.records_decoded >= before.records_decoded + 20);
    assert!(after.chunks_decoded >= before.chunks_decoded + 4);

    fs::remove_file(&path)?;
    Ok(())
}
