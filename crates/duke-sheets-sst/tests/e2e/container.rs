//! Writing and reading the SST through a CFB container on disk.

use crate::{table_of, us};
use duke_sheets_sst::biff::records;
use duke_sheets_sst::{encode_sst, SstOptions, SstReader, SstWriter};
use pretty_assertions::assert_eq;

fn sample() -> duke_sheets_sst::StringTable {
    let mut strings = vec![us("Name"), us("Amount"), us("Ünïcödé"), us("\u{4e2d}\u{6587}")];
    for i in 0..300 {
        strings.push(us(&format!("row {i} {}", "-".repeat(i % 50))));
    }
    strings.push(us(&"long ".repeat(4000)).with_run(0, 1).with_run(5, 2));
    table_of(strings)
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strings.xls");
    let table = sample();

    SstWriter::write_file(&path, &table, &SstOptions::default()).unwrap();
    let read = SstReader::read_file(&path, &SstOptions::default()).unwrap();
    assert_eq!(read, table);
}

#[test]
fn test_file_frames_match_encoder() {
    let table = sample();
    let bytes = SstWriter::to_bytes(&table, &SstOptions::default()).unwrap();

    let recs = SstReader::read_records(std::io::Cursor::new(&bytes))
        .unwrap()
        .unwrap();
    let frames = recs.frames();
    let mut from_file = vec![frames.head.to_vec()];
    from_file.extend(frames.continuation_bodies().map(<[u8]>::to_vec));
    assert_eq!(from_file, encode_sst(&table).unwrap());
}

#[test]
fn test_extsst_points_at_string_counts() {
    let table = sample();
    let bytes = SstWriter::to_bytes(&table, &SstOptions::default()).unwrap();

    let all = SstReader::workbook_records(std::io::Cursor::new(&bytes)).unwrap();
    let recs = SstReader::read_records(std::io::Cursor::new(&bytes))
        .unwrap()
        .unwrap();
    let ext = recs.ext_sst().unwrap().unwrap();
    assert_eq!(ext.strings_per_bucket, 8);
    assert_eq!(ext.buckets.len(), (table.len() + 7) / 8);

    for (i, bucket) in ext.buckets.iter().enumerate() {
        let rec_start = u64::from(bucket.stream_position - u32::from(bucket.record_offset));
        let rec = all
            .iter()
            .find(|r| r.stream_offset == rec_start)
            .expect("bucket points into a record");
        assert!(rec.record_type == records::SST || rec.record_type == records::CONTINUE);

        let at = bucket.record_offset as usize - records::RECORD_HEADER_SIZE;
        let count = u16::from_le_bytes([rec.data[at], rec.data[at + 1]]);
        let expected = table.get((i * 8) as u32).unwrap().char_count();
        assert_eq!(count, expected, "bucket {i}");
    }
}

#[test]
fn test_no_extsst_when_disabled() {
    let options = SstOptions {
        extsst: false,
        ..Default::default()
    };
    let bytes = SstWriter::to_bytes(&sample(), &options).unwrap();
    let recs = SstReader::read_records(std::io::Cursor::new(&bytes))
        .unwrap()
        .unwrap();
    assert!(recs.extsst.is_none());
}
