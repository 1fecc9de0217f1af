// src/dir.rs
//
// Каталог master-файла: field_count записей по 12 байт сразу за leader.
// [tag i32][position i32][length i32], position: относительно начала data region.
//
// Здесь только структурное чтение. Границы записей относительно data region
// проверяет планировщик (plan::validate_entries) до старта воркеров.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::consts::{DIR_ENTRY_SIZE, DIR_OFF_LENGTH, DIR_OFF_POSITION, DIR_OFF_TAG};
use crate::error::{MstError, Result};
use crate::leader::Leader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub tag: i32,
    pub position: i32,
    pub length: i32,
}

/// Immutable directory, insertion-ordered as stored in the file.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub entries: Vec<DirEntry>,
    // индексы entries, отсортированные по (position, index): для поиска по слоту
    by_position: Vec<usize>,
}

impl Directory {
    pub fn new(entries: Vec<DirEntry>) -> Self {
        let mut by_position: Vec<usize> = (0..entries.len()).collect();
        // sort_by_key стабильна: при равных position сохраняется порядок каталога
        by_position.sort_by_key(|&i| entries[i].position as i64);
        Self {
            entries,
            by_position,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose position falls in `[start, end)` of the data region,
    /// in (position, directory index) order.
    pub fn entries_in(&self, start: u64, end: u64) -> impl Iterator<Item = (usize, &DirEntry)> + '_ {
        let lo = self
            .by_position
            .partition_point(|&i| (self.entries[i].position as i64) < start as i64);
        self.by_position[lo..]
            .iter()
            .take_while(move |&&i| (self.entries[i].position as i64) < end as i64)
            .map(move |&i| (i, &self.entries[i]))
    }
}

/// Read `leader.field_count` entries right after the leader.
pub fn decode_directory(buf: &[u8], leader: &Leader) -> Result<Directory> {
    let start = leader.directory_offset();
    let need = start + leader.directory_len;
    if (buf.len() as u64) < need {
        return Err(MstError::TruncatedDirectory {
            expected: need,
            actual: buf.len() as u64,
        });
    }

    let n = leader.field_count as usize;
    let mut entries = Vec::with_capacity(n);
    for i in 0..n {
        let off = start as usize + i * DIR_ENTRY_SIZE;
        let e = &buf[off..off + DIR_ENTRY_SIZE];
        entries.push(DirEntry {
            tag: LittleEndian::read_i32(&e[DIR_OFF_TAG..DIR_OFF_TAG + 4]),
            position: LittleEndian::read_i32(&e[DIR_OFF_POSITION..DIR_OFF_POSITION + 4]),
            length: LittleEndian::read_i32(&e[DIR_OFF_LENGTH..DIR_OFF_LENGTH + 4]),
        });
    }
    Ok(Directory::new(entries))
}
