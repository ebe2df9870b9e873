//! Common utilities for SST E2E tests.

use duke_sheets_sst::{decode_sst, encode_sst, SstOptions, SstResult, StringTable, UnicodeString};

pub fn us(text: &str) -> UnicodeString {
    UnicodeString::new(text).unwrap()
}

pub fn table_of(strings: Vec<UnicodeString>) -> StringTable {
    let mut table = StringTable::new();
    for s in strings {
        table.add_string(s);
    }
    table
}

pub fn decode_bodies(bodies: &[Vec<u8>], options: &SstOptions) -> SstResult<StringTable> {
    decode_sst(
        &bodies[0],
        bodies[1..].iter().map(Vec::as_slice),
        options,
    )
}

/// Encode, decode with default options and check the table survives.
pub fn assert_roundtrip(table: &StringTable) -> Vec<Vec<u8>> {
    let bodies = encode_sst(table).unwrap();
    let decoded = decode_bodies(&bodies, &SstOptions::default()).unwrap();
    assert_eq!(&decoded, table);
    bodies
}
