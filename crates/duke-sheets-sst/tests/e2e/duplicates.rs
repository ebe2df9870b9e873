//! The duplicate-entry padding applied when a decoded table repeats a key.

use crate::{decode_bodies, table_of, us};
use duke_sheets_sst::{encode_sst, DedupKey, SstError, SstOptions};
use pretty_assertions::assert_eq;

fn legacy_keys() -> SstOptions {
    SstOptions {
        dedup_key: DedupKey::TextOnly,
        ..Default::default()
    }
}

#[test]
fn test_rich_variants_survive_with_full_keys() {
    let table = table_of(vec![us("Total"), us("Total").with_run(2, 1)]);
    assert_eq!(table.len(), 2);

    let bodies = encode_sst(&table).unwrap();
    let decoded = decode_bodies(&bodies, &SstOptions::default()).unwrap();
    assert_eq!(decoded.get(1).unwrap().text(), "Total");
    assert_eq!(decoded, table);
}

#[test]
fn test_text_only_keys_pad_the_later_entry() {
    let table = table_of(vec![us("Total"), us("Total").with_run(2, 1)]);
    let bodies = encode_sst(&table).unwrap();

    let decoded = decode_bodies(&bodies, &legacy_keys()).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get(0).unwrap().text(), "Total");
    let padded = decoded.get(1).unwrap();
    assert_eq!(padded.text(), "Total ");
    assert_eq!(padded.char_count(), 6);
    // formatting is kept
    assert_eq!(padded.format_runs().len(), 1);
}

#[test]
fn test_literal_duplicates_from_a_foreign_writer() {
    let mut head = Vec::new();
    head.extend_from_slice(&3u32.to_le_bytes());
    head.extend_from_slice(&3u32.to_le_bytes());
    for _ in 0..3 {
        head.extend_from_slice(&[2, 0, 0x00, b'o', b'k']);
    }
    let decoded = decode_bodies(&[head.clone()], &SstOptions::default()).unwrap();
    let texts: Vec<&str> = decoded.iter().map(|(_, s)| s.text()).collect();
    assert_eq!(texts, vec!["ok", "ok ", "ok  "]);
    // indices stay dense
    assert_eq!(decoded.index_of(&us("ok  ")), Some(2));

    let verbatim = decode_bodies(
        &[head],
        &SstOptions {
            pad_duplicates: false,
            ..Default::default()
        },
    )
    .unwrap();
    let texts: Vec<&str> = verbatim.iter().map(|(_, s)| s.text()).collect();
    assert_eq!(texts, vec!["ok", "ok", "ok"]);
    assert_eq!(verbatim.index_of(&us("ok")), Some(0));
    // re-encoding the verbatim table reproduces the input
    let bodies = encode_sst(&verbatim).unwrap();
    assert_eq!(bodies[0][8..].to_vec(), [2, 0, 0x00, b'o', b'k'].repeat(3));
}

#[test]
fn test_padding_ceiling_is_an_error() {
    let mut head = Vec::new();
    head.extend_from_slice(&2u32.to_le_bytes());
    head.extend_from_slice(&2u32.to_le_bytes());
    head.extend_from_slice(&[1, 0, 0x00, b'z', 1, 0, 0x00, b'z']);

    let options = SstOptions {
        max_padding: 0,
        ..Default::default()
    };
    let err = decode_bodies(&[head], &options).unwrap_err();
    assert!(matches!(err, SstError::DuplicateKeyUnresolved { .. }));
}
