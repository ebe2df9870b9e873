//! BIFF8 (Binary Interchange File Format) record framing.
//!
//! A BIFF8 stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//!
//! CONTINUE records (type 0x003C) extend the body of the preceding record
//! beyond the 8224-byte per-record limit. Unlike a general-purpose reader,
//! this module keeps every CONTINUE body as its own record: the SST codec
//! needs the physical frame boundaries to reassemble split strings.

pub mod parser;
pub mod records;
pub mod strings;

use crate::error::{SstError, SstResult};
use std::io::{Read, Seek, Write};

/// A single physical BIFF8 record.
#[derive(Debug, Clone)]
pub struct BiffRecord {
    /// Record type ID (e.g. `records::SST`, `records::CONTINUE`).
    pub record_type: u16,
    /// Record body bytes, header excluded.
    pub data: Vec<u8>,
    /// Byte offset of this record's header in the stream (for debugging).
    pub stream_offset: u64,
}

/// The frames that make up one logical SST: the head body followed by the
/// bodies of the CONTINUE records that immediately follow it.
#[derive(Debug, Clone, Copy)]
pub struct SstFrames<'a> {
    /// Body of the SST record (counts + first string payload).
    pub head: &'a [u8],
    /// Bodies of the trailing CONTINUE records, in stream order.
    pub continuations: &'a [BiffRecord],
    /// Stream offset of the SST record header.
    pub stream_offset: u64,
}

impl<'a> SstFrames<'a> {
    /// Iterate the continuation bodies as byte slices.
    pub fn continuation_bodies(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.continuations.iter().map(|r| r.data.as_slice())
    }
}

/// Reads all BIFF8 records from a byte stream.
///
/// CONTINUE records are returned as-is, in stream order, so callers can
/// see where one frame ends and the next begins.
pub fn read_all_records<R: Read + Seek>(stream: &mut R) -> SstResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header_buf = [0u8; records::RECORD_HEADER_SIZE];

    loop {
        let stream_offset = stream.stream_position()?;

        match stream.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(SstError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header_buf[0], header_buf[1]]);
        let body_len = u16::from_le_bytes([header_buf[2], header_buf[3]]) as usize;

        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            stream.read_exact(&mut body).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    SstError::TruncatedStream(format!(
                        "record 0x{record_type:04X} at offset {stream_offset} declares {body_len} bytes"
                    ))
                } else {
                    SstError::Io(e)
                }
            })?;
        }

        records.push(BiffRecord {
            record_type,
            data: body,
            stream_offset,
        });
    }

    Ok(records)
}

/// Locate the first SST record in `records` together with its CONTINUE frames.
///
/// Returns `None` when the stream carries no SST (workbooks without any
/// string cells omit it).
pub fn sst_frames(records: &[BiffRecord]) -> Option<SstFrames<'_>> {
    let idx = records
        .iter()
        .position(|r| r.record_type == records::SST)?;
    let head = &records[idx];
    let tail = &records[idx + 1..];
    let cont_len = tail
        .iter()
        .take_while(|r| r.record_type == records::CONTINUE)
        .count();

    Some(SstFrames {
        head: &head.data,
        continuations: &tail[..cont_len],
        stream_offset: head.stream_offset,
    })
}

/// Parse a BOF record body, returning `(version, dt)`.
pub fn parse_bof(data: &[u8]) -> SstResult<(u16, u16)> {
    if data.len() < 4 {
        return Err(SstError::InvalidFormat("BOF record too short".into()));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Ok((version, dt))
}

/// Body of a BIFF8 workbook-globals BOF record.
pub fn globals_bof_body() -> Vec<u8> {
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&records::BIFF8_VERSION.to_le_bytes());
    body.extend_from_slice(&records::BOF_WORKBOOK_GLOBALS.to_le_bytes());
    // build id/year, file history, lowest version: left zero
    body.extend_from_slice(&[0u8; 12]);
    body
}

/// Write one record: header followed by `body`.
///
/// Returns the number of bytes written (header included).
pub fn write_record<W: Write>(writer: &mut W, record_type: u16, body: &[u8]) -> SstResult<usize> {
    if body.len() > records::MAX_RECORD_BODY {
        return Err(SstError::InvalidFormat(format!(
            "record 0x{record_type:04X} body of {} bytes exceeds {}",
            body.len(),
            records::MAX_RECORD_BODY
        )));
    }
    writer.write_all(&record_type.to_le_bytes())?;
    writer.write_all(&(body.len() as u16).to_le_bytes())?;
    writer.write_all(body)?;
    Ok(records::RECORD_HEADER_SIZE + body.len())
}
