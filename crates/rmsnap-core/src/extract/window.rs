//! Page-aligned read window around the framebuffer.

use serde::Serialize;

use crate::memory::layout::PAGE_SIZE;

/// Whole pages to read so that `[offset, offset + window_bytes)` is
/// covered, plus where the wanted bytes sit inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// Index of the first page to read
    pub start_block: u64,
    /// Bytes to discard from the start of the first page
    pub byte_shift: u64,
    /// Number of pages to read
    pub block_count: u64,
    /// Bytes to keep after the shift
    pub window_bytes: u64,
}

impl PageWindow {
    pub fn new(offset: u64, window_bytes: u64) -> Self {
        Self {
            start_block: offset / PAGE_SIZE,
            byte_shift: offset % PAGE_SIZE,
            // One page of slack absorbs any shift inside the first page
            block_count: window_bytes.div_ceil(PAGE_SIZE) + 1,
            window_bytes,
        }
    }

    /// Bytes read from the remote memory image
    pub fn read_span(&self) -> u64 {
        self.block_count * PAGE_SIZE
    }

    pub fn covers_window(&self) -> bool {
        self.read_span() >= self.byte_shift + self.window_bytes
    }
}
