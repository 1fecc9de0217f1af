//! control: trailing control record (9 × i32, LE).
//!
//! Читается ровно один раз, после того как все воркеры завершились.
//! Указатели next_* описывают следующий том (multi-volume), но цепочка
//! здесь не обходится.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::consts::{
    CONTROL_SIZE, CTL_OFF_CTL_MFN, CTL_OFF_MFT_TYPE, CTL_OFF_NEXT_BLOCK_HIGH,
    CTL_OFF_NEXT_BLOCK_LOW, CTL_OFF_NEXT_MFN, CTL_OFF_RECORD_COUNT, CTL_OFF_RESERVED1,
    CTL_OFF_RESERVED2, CTL_OFF_RESERVED3,
};
use crate::error::{MstError, Result};
use crate::leader::record_count_from_halves;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRecord {
    /// File offset the record was read from.
    pub offset: u64,
    pub ctl_mfn: i32,
    pub next_mfn: i32,
    pub next_block_low: i32,
    pub next_block_high: i32,
    pub mft_type: i32,
    pub record_count: i32,
    pub reserved: [i32; 3],
}

/// Linkage to the next physical volume, as stored in the control record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextVolume {
    pub mfn: i32,
    pub block: u64,
}

impl ControlRecord {
    /// Some(..) when the record points at a following volume.
    pub fn next_volume(&self) -> Option<NextVolume> {
        let block = record_count_from_halves(self.next_block_low, self.next_block_high);
        if self.next_mfn == 0 && block == 0 {
            None
        } else {
            Some(NextVolume {
                mfn: self.next_mfn,
                block,
            })
        }
    }
}

/// Decode the control record at `offset` of the whole-file buffer.
pub fn decode_control(file: &[u8], offset: u64) -> Result<ControlRecord> {
    let file_len = file.len() as u64;
    let remain = file_len.saturating_sub(offset);
    if remain < CONTROL_SIZE as u64 {
        return Err(MstError::TruncatedControlRecord {
            offset,
            expected: CONTROL_SIZE as u64,
            actual: remain,
        });
    }
    let start = offset as usize;
    let b = &file[start..start + CONTROL_SIZE];
    let rd = |off: usize| LittleEndian::read_i32(&b[off..off + 4]);

    Ok(ControlRecord {
        offset,
        ctl_mfn: rd(CTL_OFF_CTL_MFN),
        next_mfn: rd(CTL_OFF_NEXT_MFN),
        next_block_low: rd(CTL_OFF_NEXT_BLOCK_LOW),
        next_block_high: rd(CTL_OFF_NEXT_BLOCK_HIGH),
        mft_type: rd(CTL_OFF_MFT_TYPE),
        record_count: rd(CTL_OFF_RECORD_COUNT),
        reserved: [
            rd(CTL_OFF_RESERVED1),
            rd(CTL_OFF_RESERVED2),
            rd(CTL_OFF_RESERVED3),
        ],
    })
}
