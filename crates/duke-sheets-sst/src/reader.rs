//! XLS container reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, reads the `Workbook`
//! stream, scans its BIFF8 records and decodes the shared string table.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::biff::{self, records, BiffRecord, SstFrames};
use crate::deserializer::decode_sst;
use crate::error::{SstError, SstResult};
use crate::extsst::ExtSst;
use crate::options::SstOptions;
use crate::table::StringTable;

/// Shared string table reader for `.xls` files.
pub struct SstReader;

/// The SST records of a workbook stream: the head record, its CONTINUE
/// records and the EXTSST record when one follows them.
#[derive(Debug, Clone)]
pub struct SstRecords {
    pub head: BiffRecord,
    pub continuations: Vec<BiffRecord>,
    pub extsst: Option<BiffRecord>,
}

impl SstRecords {
    /// Collect the SST records out of a full record list.
    pub fn from_records(all: &[BiffRecord]) -> Option<Self> {
        let frames = biff::sst_frames(all)?;
        let head_idx = all
            .iter()
            .position(|r| r.record_type == records::SST)?;
        let after = head_idx + 1 + frames.continuations.len();
        let extsst = all
            .get(after)
            .filter(|r| r.record_type == records::EXTSST)
            .cloned();

        Some(Self {
            head: all[head_idx].clone(),
            continuations: frames.continuations.to_vec(),
            extsst,
        })
    }

    pub fn frames(&self) -> SstFrames<'_> {
        SstFrames {
            head: &self.head.data,
            continuations: &self.continuations,
            stream_offset: self.head.stream_offset,
        }
    }

    /// Decode the EXTSST record, if present.
    pub fn ext_sst(&self) -> SstResult<Option<ExtSst>> {
        self.extsst
            .as_ref()
            .map(|r| ExtSst::parse(&r.data))
            .transpose()
    }

    /// Decode the string table.
    pub fn decode(&self, options: &SstOptions) -> SstResult<StringTable> {
        let frames = self.frames();
        decode_sst(frames.head, frames.continuation_bodies(), options)
    }
}

impl SstReader {
    /// Read the shared string table of an XLS file.
    pub fn read_file<P: AsRef<Path>>(path: P, options: &SstOptions) -> SstResult<StringTable> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file, options)
    }

    /// Read the shared string table from any `Read + Seek` source.
    ///
    /// A workbook without an SST record yields an empty table.
    pub fn read<R: Read + Seek>(reader: R, options: &SstOptions) -> SstResult<StringTable> {
        match Self::read_records(reader)? {
            Some(sst) => sst.decode(options),
            None => {
                log::debug!("workbook has no SST record");
                Ok(StringTable::with_options(options.clone()))
            }
        }
    }

    /// Read the raw SST records of an XLS file.
    pub fn read_records_file<P: AsRef<Path>>(path: P) -> SstResult<Option<SstRecords>> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_records(file)
    }

    pub fn read_records<R: Read + Seek>(reader: R) -> SstResult<Option<SstRecords>> {
        let all = Self::workbook_records(reader)?;
        Ok(SstRecords::from_records(&all))
    }

    /// All BIFF8 records of the workbook stream, CONTINUE records kept apart.
    pub fn workbook_records<R: Read + Seek>(reader: R) -> SstResult<Vec<BiffRecord>> {
        // Open CFB container
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // Read the "Workbook" stream (some files use "Book")
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(SstError::InvalidFormat(
                "no Workbook or Book stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        {
            let mut stream = cfb.open_stream(stream_path)?;
            stream.read_to_end(&mut stream_data)?;
        }

        let mut cursor = Cursor::new(&stream_data);
        let all_records = biff::read_all_records(&mut cursor)?;

        match all_records.first() {
            Some(rec) if rec.record_type == records::BOF => {
                let (version, dt) = biff::parse_bof(&rec.data)?;
                if version != records::BIFF8_VERSION || dt != records::BOF_WORKBOOK_GLOBALS {
                    return Err(SstError::InvalidFormat(format!(
                        "expected BIFF8 workbook globals, got version 0x{version:04X} type 0x{dt:04X}"
                    )));
                }
            }
            _ => {
                return Err(SstError::InvalidFormat(
                    "workbook stream does not start with a BOF record".into(),
                ))
            }
        }

        log::debug!(
            "read {} records from {stream_path} ({} bytes)",
            all_records.len(),
            stream_data.len()
        );
        Ok(all_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biff::write_record;

    fn container(stream_name: &str, stream: &[u8]) -> Vec<u8> {
        use std::io::Write;
        let mut ole = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut s = ole.create_stream(stream_name).unwrap();
            s.write_all(stream).unwrap();
        }
        ole.into_inner().into_inner()
    }

    fn workbook(body: &[(u16, &[u8])]) -> Vec<u8> {
        let mut stream = Vec::new();
        write_record(&mut stream, records::BOF, &biff::globals_bof_body()).unwrap();
        for (record_type, data) in body {
            write_record(&mut stream, *record_type, data).unwrap();
        }
        write_record(&mut stream, records::EOF, &[]).unwrap();
        stream
    }

    #[test]
    fn test_read_sst_and_extsst() {
        let sst = [1, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, b'h'];
        let stream = workbook(&[
            (records::SST, &sst[..]),
            (records::CONTINUE, &[0x00, b'i'][..]),
            (records::EXTSST, &[8, 0, 32, 0, 0, 0, 12, 0, 0, 0][..]),
        ]);
        let file = container("Workbook", &stream);

        let table = SstReader::read(Cursor::new(&file), &SstOptions::default()).unwrap();
        assert_eq!(table.get(0).unwrap().text(), "hi");

        let recs = SstReader::read_records(Cursor::new(&file)).unwrap().unwrap();
        assert_eq!(recs.continuations.len(), 1);
        let ext = recs.ext_sst().unwrap().unwrap();
        assert_eq!(ext.buckets[0].stream_position, 32);
    }

    #[test]
    fn test_book_stream_without_sst() {
        let file = container("Book", &workbook(&[]));
        let table = SstReader::read(Cursor::new(&file), &SstOptions::default()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_workbook_stream() {
        let file = container("Other", &workbook(&[]));
        assert!(matches!(
            SstReader::read(Cursor::new(&file), &SstOptions::default()),
            Err(SstError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_stream_must_start_with_bof() {
        let mut stream = Vec::new();
        write_record(&mut stream, records::SST, &[0; 8]).unwrap();
        let file = container("Workbook", &stream);
        assert!(SstReader::read_records(Cursor::new(&file)).is_err());
    }
}
