// Общие хелперы интеграционных тестов: уникальные пути и сборка MST-образов.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("msttest-{prefix}-{pid}-{t}-{id}.mst"))
}

/// In-memory description of a master file, serialised in canonical layout
/// unless `base_address` is overridden.
#[derive(Debug, Clone)]
pub struct MstImage {
    pub ctl_mfn: i32,
    pub record_length: i32,
    pub records: u64,
    pub base_address: Option<i32>,
    pub status: i32,
    pub version: i32,
    /// (tag, position, length)
    pub entries: Vec<(i32, i32, i32)>,
    pub data: Vec<u8>,
    pub control_record_count: i32,
    pub next_mfn: i32,
}

impl MstImage {
    /// `records` slots of `record_length` bytes; one field per slot filling
    /// `fill` bytes of it, tag = 100 + slot % 7, payload = ASCII text.
    pub fn with_records(record_length: i32, records: u64, fill: i32) -> Self {
        let rl = record_length as usize;
        let mut data = vec![0u8; rl * records as usize];
        let mut entries = Vec::new();
        for slot in 0..records as usize {
            let text = format!("rec{:06}-", slot);
            for i in 0..fill as usize {
                data[slot * rl + i] = text.as_bytes()[i % text.len()];
            }
            entries.push((100 + (slot % 7) as i32, (slot * rl) as i32, fill));
        }
        Self {
            ctl_mfn: 0,
            record_length,
            records,
            base_address: None,
            status: 0,
            version: 1,
            entries,
            data,
            control_record_count: records as i32,
            next_mfn: 0,
        }
    }

    pub fn directory_len(&self) -> usize {
        12 * self.entries.len()
    }

    pub fn canonical_base(&self) -> usize {
        32 + self.directory_len()
    }

    pub fn base(&self) -> usize {
        self.base_address
            .map(|b| b as usize)
            .unwrap_or_else(|| self.canonical_base())
    }

    pub fn control_offset(&self) -> usize {
        self.base() + self.data.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        // leader
        out.write_i32::<LittleEndian>(self.ctl_mfn)?;
        out.write_i32::<LittleEndian>(self.record_length)?;
        out.write_i32::<LittleEndian>(self.records as u32 as i32)?;
        out.write_i32::<LittleEndian>((self.records >> 32) as u32 as i32)?;
        out.write_i32::<LittleEndian>(self.base() as i32)?;
        out.write_i32::<LittleEndian>(self.entries.len() as i32)?;
        out.write_i32::<LittleEndian>(self.status)?;
        out.write_i32::<LittleEndian>(self.version)?;
        // directory
        for (t, p, l) in &self.entries {
            out.write_i32::<LittleEndian>(*t)?;
            out.write_i32::<LittleEndian>(*p)?;
            out.write_i32::<LittleEndian>(*l)?;
        }
        // gap (non-canonical base)
        out.resize(self.base(), 0xA5);
        out.extend_from_slice(&self.data);
        // control record
        out.write_i32::<LittleEndian>(self.ctl_mfn)?;
        out.write_i32::<LittleEndian>(self.next_mfn)?;
        out.write_i32::<LittleEndian>(0)?;
        out.write_i32::<LittleEndian>(0)?;
        out.write_i32::<LittleEndian>(0)?; // mft_type
        out.write_i32::<LittleEndian>(self.control_record_count)?;
        out.write_i32::<LittleEndian>(0)?;
        out.write_i32::<LittleEndian>(0)?;
        out.write_i32::<LittleEndian>(0)?;
        Ok(out)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

pub fn write_bytes(prefix: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = unique_path(prefix);
    fs::write(&path, bytes)?;
    Ok(path)
}
