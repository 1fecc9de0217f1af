//! Общие константы формата master-файла (leader, directory, control record).
//!
//! Все поля: little-endian i32.

// -------- Leader --------
/// Фиксированный размер leader (8 × i32).
pub const LEADER_SIZE: usize = 32;

// Offsets inside leader
pub const LDR_OFF_CTL_MFN: usize = 0;
pub const LDR_OFF_RECORD_LENGTH: usize = 4;
pub const LDR_OFF_BLOCK_LOW: usize = 8;
pub const LDR_OFF_BLOCK_HIGH: usize = 12;
pub const LDR_OFF_BASE_ADDRESS: usize = 16;
pub const LDR_OFF_FIELD_COUNT: usize = 20;
pub const LDR_OFF_STATUS: usize = 24;
pub const LDR_OFF_VERSION: usize = 28;

// -------- Directory --------
/// Размер одной записи каталога: [tag i32][position i32][length i32].
pub const DIR_ENTRY_SIZE: usize = 12;

pub const DIR_OFF_TAG: usize = 0;
pub const DIR_OFF_POSITION: usize = 4;
pub const DIR_OFF_LENGTH: usize = 8;

// -------- Control record --------
/// Фиксированный размер control record (9 × i32).
pub const CONTROL_SIZE: usize = 36;

pub const CTL_OFF_CTL_MFN: usize = 0;
pub const CTL_OFF_NEXT_MFN: usize = 4;
pub const CTL_OFF_NEXT_BLOCK_LOW: usize = 8;
pub const CTL_OFF_NEXT_BLOCK_HIGH: usize = 12;
pub const CTL_OFF_MFT_TYPE: usize = 16;
pub const CTL_OFF_RECORD_COUNT: usize = 20;
pub const CTL_OFF_RESERVED1: usize = 24;
pub const CTL_OFF_RESERVED2: usize = 28;
pub const CTL_OFF_RESERVED3: usize = 32;

// -------- Env toggles --------
pub const ENV_WORKERS: &str = "MST_WORKERS";
pub const ENV_SHARED_LOCK: &str = "MST_SHARED_LOCK";
pub const ENV_VERIFY_CONTROL: &str = "MST_VERIFY_CONTROL";
