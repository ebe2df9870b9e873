//! # duke-sheets-sst
//!
//! BIFF8 shared string table (SST) codec for duke-sheets.
//!
//! Strings in an `.xls` workbook live in one SST record whose body is split
//! over CONTINUE records once it outgrows the 8224-byte record limit. This
//! crate models the table ([`StringTable`], [`UnicodeString`]), plans the
//! frame split ([`plan_frames`]), emits the frames ([`serialize_frames`]) and
//! reassembles them ([`decode_sst`]), including strings cut mid-way by a
//! frame boundary.
//!
//! ```
//! use duke_sheets_sst::{decode_sst, encode_sst, SstOptions, StringTable, UnicodeString};
//!
//! let mut table = StringTable::new();
//! table.add_string(UnicodeString::new("Hello").unwrap());
//! table.add_string(UnicodeString::new("Hello").unwrap());
//!
//! let bodies = encode_sst(&table).unwrap();
//! let decoded = decode_sst(&bodies[0], bodies[1..].iter().map(Vec::as_slice), &SstOptions::default()).unwrap();
//! assert_eq!(decoded, table);
//! ```

pub mod biff;
pub mod deserializer;
pub mod error;
pub mod extsst;
pub mod layout;
pub mod options;
pub mod plan;
pub mod reader;
pub mod serializer;
pub mod string;
pub mod table;
pub mod writer;

pub use deserializer::{decode_frame, decode_sst, DecodeState, PendingPart, PendingString};
pub use error::{SstError, SstResult};
pub use extsst::{ExtSst, ExtSstBucket};
pub use options::{DedupKey, SstOptions};
pub use plan::{plan_frames, FramePlan};
pub use reader::{SstReader, SstRecords};
pub use serializer::{encode_sst, serialize_frames, FrameKind, StringAnchor};
pub use string::{CharWidth, FormatRun, StringFlags, UnicodeString};
pub use table::StringTable;
pub use writer::SstWriter;
