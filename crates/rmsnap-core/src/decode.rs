//! LZ4 frame decoder for transferred framebuffers.

use std::io::Read;

use lz4_flex::frame::FrameDecoder;
use tracing::debug;

use crate::error::{Error, Result};

/// Raw framebuffer bytes of exactly one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
}

impl RawFrame {
    /// Wrap `bytes`, checking the length against the frame geometry.
    pub fn new(bytes: Vec<u8>, expected_len: usize) -> Result<Self> {
        if bytes.len() != expected_len {
            return Err(Error::FrameLengthMismatch {
                expected: expected_len,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Decompresses a transferred frame and validates its size.
pub struct StreamDecoder {
    expected_len: usize,
}

impl StreamDecoder {
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }

    /// Decompress `compressed` into exactly one frame.
    ///
    /// At most one byte past the expected length is inflated, so an
    /// oversized stream is rejected without decompressing all of it.
    pub fn decode(&self, compressed: &[u8]) -> Result<RawFrame> {
        let limit = self.expected_len as u64 + 1;
        let mut bytes = Vec::with_capacity(self.expected_len);
        FrameDecoder::new(compressed)
            .take(limit)
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Decompress(e.to_string()))?;
        debug!("Decompressed {} -> {} bytes", compressed.len(), bytes.len());
        RawFrame::new(bytes, self.expected_len)
    }
}
