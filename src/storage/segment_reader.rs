use std::fs::File;
use std::io::Read;
use crc32fast::Hasher;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{corrupt, SegmentBody, SegmentHeader};

/// Upper bound on LZ4 block expansion; a larger claimed raw length is a
/// damaged header.
const MAX_LZ4_RATIO: u64 = 255;

pub struct SegmentReader {
    pub header: SegmentHeader,
    pub file: File,  // Held open for the lifetime of the reader
}

impl SegmentReader {
    pub fn open(layout: &StorageLayout) -> Result<(Self, SegmentBody)> {
        let path = layout.segment_path();
        let mut file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::new(
                ErrorKind::NotFound,
                format!("no index at {}", layout.base_dir().display()),
            ),
            _ => Error::from(e),
        })?;
        let file_len = file.metadata()?.len();

        // Read header
        let mut header_buf = vec![0u8; SegmentHeader::SIZE];
        file.read_exact(&mut header_buf)
            .map_err(|_| corrupt(format!("truncated header in {}", path.display())))?;
        let header: SegmentHeader = bincode::deserialize(&header_buf)
            .map_err(|e| corrupt(format!("unreadable header in {}: {}", path.display(), e)))?;

        // Verify version
        if header.version != SegmentHeader::VERSION {
            return Err(corrupt(format!(
                "incompatible segment version {} in {}",
                header.version,
                path.display()
            )));
        }

        // The header is not checksummed; check its lengths before trusting them
        let stored = file_len.saturating_sub(SegmentHeader::SIZE as u64);
        if header.body_len != stored {
            return Err(corrupt(format!(
                "header claims a {} byte body, {} has {}",
                header.body_len,
                path.display(),
                stored
            )));
        }
        let max_raw = match header.compression {
            CompressionType::None => header.body_len,
            CompressionType::LZ4 => header.body_len.saturating_mul(MAX_LZ4_RATIO),
        };
        if header.raw_len > max_raw {
            return Err(corrupt(format!(
                "header claims {} raw bytes from a {} byte body in {}",
                header.raw_len,
                header.body_len,
                path.display()
            )));
        }

        let mut body_buf = vec![0u8; header.body_len as usize];
        file.read_exact(&mut body_buf)
            .map_err(|_| corrupt(format!("truncated body in {}", path.display())))?;

        let mut hasher = Hasher::new();
        hasher.update(&body_buf);
        if hasher.finalize() != header.checksum {
            return Err(corrupt(format!("checksum mismatch in {}", path.display())));
        }

        let raw = CompressedBlock::decompress(&body_buf, header.raw_len as usize, header.compression)?;
        let body: SegmentBody = bincode::deserialize(&raw)?;

        if body.doc_count() != header.doc_count {
            return Err(corrupt(format!(
                "header claims {} documents, body holds {}",
                header.doc_count,
                body.doc_count()
            )));
        }

        Ok((SegmentReader { header, file }, body))
    }
}
