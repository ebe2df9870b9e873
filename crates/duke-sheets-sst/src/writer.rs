//! SST record writer.
//!
//! Emits the SST record, its CONTINUE records and the EXTSST index into a
//! BIFF8 stream, and can wrap a minimal workbook stream holding only the
//! shared strings into a CFB container.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use crate::biff::{self, records};
use crate::error::SstResult;
use crate::extsst::ExtSst;
use crate::options::SstOptions;
use crate::plan::plan_frames;
use crate::serializer::serialize_frames;
use crate::table::StringTable;

/// Shared string table writer.
pub struct SstWriter;

impl SstWriter {
    /// Write the SST records of `table` to `writer`.
    ///
    /// `stream_offset` is the position in the workbook stream where the SST
    /// record starts; the EXTSST entries are absolute positions. Returns the
    /// number of bytes written.
    pub fn write_records<W: Write>(
        writer: &mut W,
        table: &StringTable,
        stream_offset: u64,
        options: &SstOptions,
    ) -> SstResult<usize> {
        let plan = plan_frames(table);

        // the frames are staged so a plan mismatch leaves `writer` untouched
        let mut staged = Vec::with_capacity(plan.total_record_bytes());
        let anchors = serialize_frames(table, &plan, |kind, body| {
            biff::write_record(&mut staged, kind.record_type(), body).map(|_| ())
        })?;
        writer.write_all(&staged)?;
        let mut written = staged.len();

        if options.extsst {
            let ext = ExtSst::build(&anchors, &plan, stream_offset);
            written += biff::write_record(writer, records::EXTSST, &ext.to_bytes())?;
        }

        log::debug!(
            "wrote SST: {} unique / {} total strings, {} bytes",
            table.unique_count(),
            table.total_reference_count(),
            written
        );
        Ok(written)
    }

    /// Build a workbook stream holding a globals BOF, the SST records and EOF.
    pub fn workbook_stream(table: &StringTable, options: &SstOptions) -> SstResult<Vec<u8>> {
        let mut stream = Vec::new();
        biff::write_record(&mut stream, records::BOF, &biff::globals_bof_body())?;
        let offset = stream.len() as u64;
        Self::write_records(&mut stream, table, offset, options)?;
        biff::write_record(&mut stream, records::EOF, &[])?;
        Ok(stream)
    }

    /// Write a CFB container whose `Workbook` stream holds the table.
    pub fn write<W: Read + Write + Seek>(
        writer: W,
        table: &StringTable,
        options: &SstOptions,
    ) -> SstResult<W> {
        let stream = Self::workbook_stream(table, options)?;
        let mut cfb = cfb::CompoundFile::create(writer)?;
        {
            let mut out = cfb.create_stream("/Workbook")?;
            out.write_all(&stream)?;
        }
        cfb.flush()?;
        Ok(cfb.into_inner())
    }

    pub fn write_file<P: AsRef<Path>>(
        path: P,
        table: &StringTable,
        options: &SstOptions,
    ) -> SstResult<()> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Self::write(file, table, options)?;
        Ok(())
    }

    /// In-memory variant of [`SstWriter::write`].
    pub fn to_bytes(table: &StringTable, options: &SstOptions) -> SstResult<Vec<u8>> {
        Ok(Self::write(Cursor::new(Vec::new()), table, options)?.into_inner())
    }
}
