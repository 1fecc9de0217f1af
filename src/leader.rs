// src/leader.rs: leader (фиксированный заголовок master-файла)
//
// Формат (LE, offset 0, 32 байта):
// i32 ctl_mfn         номер control-блока
// i32 record_length   байт на слот (> 0)
// i32 block_low       младшие 32 бита числа записей
// i32 block_high      старшие 32 бита числа записей
// i32 base_address    смещение начала data region
// i32 field_count     число записей каталога (>= 0)
// i32 status
// i32 version
//
// Политика:
// - decode_leader: чистая функция над срезом, без I/O.
// - все производные размеры (directory_len, data_len) считаются checked_*,
//   переполнение => MalformedHeader.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::consts::{
    DIR_ENTRY_SIZE, LDR_OFF_BASE_ADDRESS, LDR_OFF_BLOCK_HIGH, LDR_OFF_BLOCK_LOW,
    LDR_OFF_CTL_MFN, LDR_OFF_FIELD_COUNT, LDR_OFF_RECORD_LENGTH, LDR_OFF_STATUS,
    LDR_OFF_VERSION, LEADER_SIZE,
};
use crate::error::{MstError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leader {
    pub ctl_mfn: i32,
    pub record_length: u32,
    pub block_low: i32,
    pub block_high: i32,
    pub base_address: u64,
    pub field_count: u32,
    pub status: i32,
    pub version: i32,

    // Производные значения (валидированы при decode)
    pub record_count: u64,
    pub directory_len: u64,
    pub data_len: u64,
}

impl Leader {
    /// Смещение, с которого начинается каталог.
    #[inline]
    pub fn directory_offset(&self) -> u64 {
        LEADER_SIZE as u64
    }

    /// Конец data region (и начало control record).
    #[inline]
    pub fn data_end(&self) -> u64 {
        // переполнение исключено проверкой в decode_leader
        self.base_address + self.data_len
    }

    /// Canonical layout: data region сразу за каталогом.
    pub fn is_canonical(&self) -> bool {
        self.base_address == LEADER_SIZE as u64 + self.directory_len
    }
}

/// Combine the two halves of the record count.
#[inline]
pub fn record_count_from_halves(low: i32, high: i32) -> u64 {
    ((high as u32 as u64) << 32) | (low as u32 as u64)
}

/// Decode the leader from the first bytes of a master file.
pub fn decode_leader(buf: &[u8]) -> Result<Leader> {
    if buf.len() < LEADER_SIZE {
        return Err(MstError::malformed(
            0,
            format!(
                "file is {} byte(s), leader needs {}",
                buf.len(),
                LEADER_SIZE
            ),
        ));
    }

    let rd = |off: usize| LittleEndian::read_i32(&buf[off..off + 4]);

    let ctl_mfn = rd(LDR_OFF_CTL_MFN);
    let record_length = rd(LDR_OFF_RECORD_LENGTH);
    let block_low = rd(LDR_OFF_BLOCK_LOW);
    let block_high = rd(LDR_OFF_BLOCK_HIGH);
    let base_address = rd(LDR_OFF_BASE_ADDRESS);
    let field_count = rd(LDR_OFF_FIELD_COUNT);
    let status = rd(LDR_OFF_STATUS);
    let version = rd(LDR_OFF_VERSION);

    if record_length <= 0 {
        return Err(MstError::malformed(
            LDR_OFF_RECORD_LENGTH as u64,
            format!("record length must be > 0, got {}", record_length),
        ));
    }
    if field_count < 0 {
        return Err(MstError::malformed(
            LDR_OFF_FIELD_COUNT as u64,
            format!("field count must be >= 0, got {}", field_count),
        ));
    }
    if base_address < 0 {
        return Err(MstError::malformed(
            LDR_OFF_BASE_ADDRESS as u64,
            format!("base address must be >= 0, got {}", base_address),
        ));
    }

    let record_length = record_length as u32;
    let field_count = field_count as u32;
    let base_address = base_address as u64;
    let record_count = record_count_from_halves(block_low, block_high);

    let directory_len = (field_count as u64)
        .checked_mul(DIR_ENTRY_SIZE as u64)
        .ok_or_else(|| {
            MstError::malformed(
                LDR_OFF_FIELD_COUNT as u64,
                format!("directory size overflows for {} field(s)", field_count),
            )
        })?;
    let header_and_dir = directory_len
        .checked_add(LEADER_SIZE as u64)
        .ok_or_else(|| MstError::malformed(LDR_OFF_FIELD_COUNT as u64, "directory end overflows"))?;

    let data_len = (record_length as u64)
        .checked_mul(record_count)
        .ok_or_else(|| {
            MstError::malformed(
                LDR_OFF_BLOCK_LOW as u64,
                format!(
                    "data region size overflows: {} record(s) × {} byte(s)",
                    record_count, record_length
                ),
            )
        })?;

    if base_address < header_and_dir {
        return Err(MstError::malformed(
            LDR_OFF_BASE_ADDRESS as u64,
            format!(
                "base address {} lies inside leader+directory (ends at {})",
                base_address, header_and_dir
            ),
        ));
    }
    if base_address.checked_add(data_len).is_none() {
        return Err(MstError::malformed(
            LDR_OFF_BASE_ADDRESS as u64,
            "data region end overflows",
        ));
    }

    Ok(Leader {
        ctl_mfn,
        record_length,
        block_low,
        block_high,
        base_address,
        field_count,
        status,
        version,
        record_count,
        directory_len,
        data_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn leader_bytes(rec_len: i32, low: i32, high: i32, base: i32, nvf: i32) -> Vec<u8> {
        let mut b = vec![0u8; LEADER_SIZE];
        LittleEndian::write_i32(&mut b[LDR_OFF_CTL_MFN..], 0);
        LittleEndian::write_i32(&mut b[LDR_OFF_RECORD_LENGTH..], rec_len);
        LittleEndian::write_i32(&mut b[LDR_OFF_BLOCK_LOW..], low);
        LittleEndian::write_i32(&mut b[LDR_OFF_BLOCK_HIGH..], high);
        LittleEndian::write_i32(&mut b[LDR_OFF_BASE_ADDRESS..], base);
        LittleEndian::write_i32(&mut b[LDR_OFF_FIELD_COUNT..], nvf);
        LittleEndian::write_i32(&mut b[LDR_OFF_STATUS..], 0);
        LittleEndian::write_i32(&mut b[LDR_OFF_VERSION..], 1);
        b
    }

    #[test]
    fn decodes_canonical_leader() {
        // 3 поля, 3 записи по 50 байт
        let b = leader_bytes(50, 3, 0, 32 + 36, 3);
        let l = decode_leader(&b).unwrap();
        assert_eq!(l.record_length, 50);
        assert_eq!(l.record_count, 3);
        assert_eq!(l.directory_len, 36);
        assert_eq!(l.data_len, 150);
        assert_eq!(l.data_end(), 68 + 150);
        assert!(l.is_canonical());
    }

    #[test]
    fn record_count_uses_both_halves() {
        assert_eq!(record_count_from_halves(5, 0), 5);
        assert_eq!(record_count_from_halves(0, 1), 1u64 << 32);
        // отрицательная младшая половина трактуется как беззнаковая
        assert_eq!(record_count_from_halves(-1, 0), u32::MAX as u64);
    }

    #[test]
    fn short_buffer_is_malformed() {
        let b = leader_bytes(50, 1, 0, 32, 0);
        let err = decode_leader(&b[..20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn non_positive_record_length_is_malformed() {
        for rl in [0, -7] {
            let b = leader_bytes(rl, 1, 0, 32, 0);
            assert_eq!(decode_leader(&b).unwrap_err().kind(), ErrorKind::MalformedHeader);
        }
    }

    #[test]
    fn negative_field_count_is_malformed() {
        let b = leader_bytes(50, 1, 0, 32, -1);
        assert_eq!(decode_leader(&b).unwrap_err().kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn base_inside_directory_is_malformed() {
        // 2 поля => directory заканчивается на 56
        let b = leader_bytes(50, 1, 0, 40, 2);
        assert_eq!(decode_leader(&b).unwrap_err().kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn huge_record_count_overflow_is_malformed() {
        let b = leader_bytes(i32::MAX, -1, i32::MAX, 32, 0);
        assert_eq!(decode_leader(&b).unwrap_err().kind(), ErrorKind::MalformedHeader);
    }
}
