//! document: результат чтения master-файла.
//!
//! Document полностью принадлежит вызывающему: reader не хранит ссылок на него
//! и на mmap после возврата.

use crc32fast::Hasher as Crc32;
use serde::Serialize;

use crate::control::ControlRecord;
use crate::leader::Leader;

/// One decoded field occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub tag: i32,
    /// Ordinal of the directory entry this field came from.
    pub index: usize,
    /// Record slot that holds the payload.
    pub slot: u64,
    /// Offset relative to the data-region start.
    pub position: u64,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub leader: Leader,
    pub fields: Vec<Field>,
    pub control: ControlRecord,
}

impl Document {
    pub fn fields_with_tag(&self, tag: i32) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    pub fn payload_bytes(&self) -> u64 {
        self.fields.iter().map(|f| f.payload.len() as u64).sum()
    }

    /// CRC32 over the ordered field sequence (tag, position, payload).
    pub fn checksum(&self) -> u32 {
        let mut h = Crc32::new();
        for f in &self.fields {
            h.update(&f.tag.to_le_bytes());
            h.update(&f.position.to_le_bytes());
            h.update(&(f.payload.len() as u64).to_le_bytes());
            h.update(&f.payload);
        }
        h.finalize()
    }
}
