use std::fs::{self, File};
use std::io::Write;
use crc32fast::Hasher;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentBodyRef, SegmentHeader};
use crate::core::error::Result;

pub struct SegmentWriter {
    pub compression: CompressionType,
}

impl Default for SegmentWriter {
    fn default() -> Self {
        SegmentWriter {
            compression: CompressionType::LZ4,
        }
    }
}

/// A segment serialized, compressed and checksummed, ready to be written.
pub struct EncodedSegment {
    header: Vec<u8>,
    body: Vec<u8>,
    doc_count: u32,
}

impl SegmentWriter {
    // [ HEADER (doc_count, checksum, lengths) ] <- byte 0
    // [ BODY (documents, term FST, postings, metadata) ]
    pub fn encode(&self, body: &SegmentBodyRef) -> Result<EncodedSegment> {
        let raw = bincode::serialize(body)?;
        let compressed = CompressedBlock::compress(&raw, self.compression);
        drop(raw);

        let mut hasher = Hasher::new();
        hasher.update(&compressed.data);

        let header = SegmentHeader::new(
            body.doc_count(),
            hasher.finalize(),
            compressed.compression,
            compressed.data.len() as u64,
            compressed.original_size as u64,
        );
        let header = bincode::serialize(&header)?;
        debug_assert_eq!(header.len(), SegmentHeader::SIZE);

        Ok(EncodedSegment {
            header,
            body: compressed.data,
            doc_count: body.doc_count(),
        })
    }
}

impl EncodedSegment {
    pub fn size_bytes(&self) -> u64 {
        (self.header.len() + self.body.len()) as u64
    }

    /// Written beside the live segment and renamed over it, so readers see
    /// either the old segment or the new one.
    pub fn write(self, layout: &StorageLayout) -> Result<Segment> {
        let tmp_path = layout.temp_segment_path();
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&self.header)?;
            file.write_all(&self.body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, layout.segment_path())?;
        sync_dir(layout)?;

        Ok(Segment {
            doc_count: self.doc_count,
            size_bytes: self.size_bytes(),
        })
    }
}

#[cfg(unix)]
fn sync_dir(layout: &StorageLayout) -> Result<()> {
    // Persist the rename itself
    File::open(layout.base_dir())?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_layout: &StorageLayout) -> Result<()> {
    Ok(())
}
