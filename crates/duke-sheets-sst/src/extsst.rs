//! EXTSST: the bucket index written after the SST frames.
//!
//! Every `strings_per_bucket`-th string gets an entry pointing at its first
//! byte, both as an absolute stream position and as an offset inside the
//! record that holds it.

use crate::biff::parser::{read_u16, read_u32};
use crate::biff::records::RECORD_HEADER_SIZE;
use crate::error::{SstError, SstResult};
use crate::plan::FramePlan;
use crate::serializer::StringAnchor;

/// Minimum strings per bucket
pub const MIN_STRINGS_PER_BUCKET: usize = 8;
/// Buckets aimed for before the bucket size starts to grow
pub const TARGET_BUCKETS: usize = 128;

const BUCKET_ENTRY_SIZE: usize = 8;

/// One `ISSTInf` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtSstBucket {
    /// Absolute stream position of the bucket's first string
    pub stream_position: u32,
    /// Offset of that string from the start of its record, header included
    pub record_offset: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtSst {
    pub strings_per_bucket: u16,
    pub buckets: Vec<ExtSstBucket>,
}

/// Bucket size for a table of `unique` strings.
pub fn strings_per_bucket_for(unique: usize) -> usize {
    ((unique + TARGET_BUCKETS - 1) / TARGET_BUCKETS).max(MIN_STRINGS_PER_BUCKET)
}

impl ExtSst {
    /// Build the index from the anchors returned by the serializer.
    ///
    /// `sst_stream_offset` is the position of the SST record header in the
    /// workbook stream.
    pub fn build(anchors: &[StringAnchor], plan: &FramePlan, sst_stream_offset: u64) -> Self {
        let dsst = strings_per_bucket_for(anchors.len());

        let mut record_starts = Vec::with_capacity(plan.frame_count());
        let mut pos = sst_stream_offset;
        for i in 0..plan.frame_count() {
            record_starts.push(pos);
            pos += (RECORD_HEADER_SIZE + plan.record_body_len(i).unwrap_or(0)) as u64;
        }

        let buckets = anchors
            .iter()
            .step_by(dsst)
            .map(|a| {
                let record_offset = RECORD_HEADER_SIZE + a.offset;
                let start = record_starts.get(a.frame).copied().unwrap_or(pos);
                ExtSstBucket {
                    stream_position: (start + record_offset as u64) as u32,
                    record_offset: record_offset as u16,
                }
            })
            .collect();

        Self {
            strings_per_bucket: dsst as u16,
            buckets,
        }
    }

    /// Record body length
    pub fn record_len(&self) -> usize {
        2 + self.buckets.len() * BUCKET_ENTRY_SIZE
    }

    /// Encode the record body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.record_len());
        out.extend_from_slice(&self.strings_per_bucket.to_le_bytes());
        for bucket in &self.buckets {
            out.extend_from_slice(&bucket.stream_position.to_le_bytes());
            out.extend_from_slice(&bucket.record_offset.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    /// Decode a record body
    pub fn parse(data: &[u8]) -> SstResult<Self> {
        if data.len() < 2 || (data.len() - 2) % BUCKET_ENTRY_SIZE != 0 {
            return Err(SstError::InvalidFormat(format!(
                "EXTSST body of {} bytes is not 2 + 8n",
                data.len()
            )));
        }
        let mut offset = 0;
        let strings_per_bucket = read_u16(data, &mut offset)?;
        let mut buckets = Vec::with_capacity((data.len() - 2) / BUCKET_ENTRY_SIZE);
        while offset < data.len() {
            let stream_position = read_u32(data, &mut offset)?;
            let record_offset = read_u16(data, &mut offset)?;
            let _reserved = read_u16(data, &mut offset)?;
            buckets.push(ExtSstBucket {
                stream_position,
                record_offset,
            });
        }
        Ok(Self {
            strings_per_bucket,
            buckets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_frames;
    use crate::serializer::serialize_frames;
    use crate::string::UnicodeString;
    use crate::table::StringTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bucket_size() {
        assert_eq!(strings_per_bucket_for(0), 8);
        assert_eq!(strings_per_bucket_for(1000), 8);
        assert_eq!(strings_per_bucket_for(1024), 8);
        assert_eq!(strings_per_bucket_for(1025), 9);
        assert_eq!(strings_per_bucket_for(10_000), 79);
    }

    #[test]
    fn test_positions_follow_frames() {
        let mut table = StringTable::new();
        table.add_string(UnicodeString::new("x".repeat(9000)).unwrap());
        for i in 0..9 {
            table.add_string(UnicodeString::new(format!("s{i}")).unwrap());
        }
        let plan = plan_frames(&table);
        let anchors = serialize_frames(&table, &plan, |_, _| Ok(())).unwrap();
        let ext = ExtSst::build(&anchors, &plan, 100);

        assert_eq!(ext.strings_per_bucket, 8);
        assert_eq!(ext.buckets.len(), 2);
        // first string right after the SST header and counts
        assert_eq!(
            ext.buckets[0],
            ExtSstBucket {
                stream_position: 100 + 12,
                record_offset: 12,
            }
        );
        // string 8 sits in the CONTINUE record
        let a = anchors[8];
        assert_eq!(a.frame, 1);
        let cont_start = 100 + 4 + plan.record_body_len(0).unwrap() as u32;
        assert_eq!(
            ext.buckets[1],
            ExtSstBucket {
                stream_position: cont_start + 4 + a.offset as u32,
                record_offset: 4 + a.offset as u16,
            }
        );
    }

    #[test]
    fn test_bytes() {
        let ext = ExtSst {
            strings_per_bucket: 8,
            buckets: vec![ExtSstBucket {
                stream_position: 0x0102,
                record_offset: 12,
            }],
        };
        let bytes = ext.to_bytes();
        assert_eq!(bytes, vec![8, 0, 0x02, 0x01, 0, 0, 12, 0, 0, 0]);
        assert_eq!(ext.record_len(), bytes.len());
        assert_eq!(ExtSst::parse(&bytes).unwrap(), ext);
    }

    #[test]
    fn test_parse_rejects_ragged_body() {
        assert!(matches!(
            ExtSst::parse(&[8, 0, 1, 2, 3]),
            Err(SstError::InvalidFormat(_))
        ));
        assert!(ExtSst::parse(&[]).is_err());
    }
}
