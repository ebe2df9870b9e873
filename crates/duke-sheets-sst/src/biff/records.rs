//! BIFF8 record type constants.
//!
//! Reference: [MS-XLS] §2.3, Record Enumeration

// ── Stream structure ────────────────────────────────────────────────────
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// ── BOF subtypes (the `dt` field) ───────────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;

/// BIFF8 version number in the BOF record
pub const BIFF8_VERSION: u16 = 0x0600;

// ── Shared strings ──────────────────────────────────────────────────────
pub const SST: u16 = 0x00FC; // Shared String Table (head frame)
pub const EXTSST: u16 = 0x00FF; // Extended SST (bucket index into the SST)
pub const LABELSST: u16 = 0x00FD; // Cell containing SST string index

/// Size of a record header: 2 bytes type + 2 bytes body length.
pub const RECORD_HEADER_SIZE: usize = 4;

/// Largest record body the format allows.
pub const MAX_RECORD_BODY: usize = 8224;
