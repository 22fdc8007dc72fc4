//! Builder for the composed remote extraction pipeline.
//!
//! The pipeline is
//!
//! ```text
//! dd if=/proc/<pid>/mem bs=<page> skip=<start> count=<blocks> 2>/dev/null |
//!     tail -c +<shift + 1> | <head> -c <bytes> | <compressor>
//! ```
//!
//! `dd` with a one-byte block size is far too slow over the device's
//! procfs, so whole pages are read and trimmed on the device.

use super::{PageWindow, RemoteTools};
use crate::error::{Error, Result};
use crate::memory::layout::PAGE_SIZE;
use crate::remote::{shell_quote, validate_remote_path};

#[derive(Debug, Clone, Default)]
pub struct ExtractionCommandBuilder {
    pid: Option<u32>,
    block_size: Option<u64>,
    skip_blocks: Option<u64>,
    block_count: Option<u64>,
    trim_leading: Option<u64>,
    keep_bytes: Option<u64>,
    head: Option<String>,
    compressor: Option<String>,
}

impl ExtractionCommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill every stage from a page window and tool set.
    pub fn from_window(pid: u32, window: &PageWindow, tools: &RemoteTools) -> Self {
        Self::new()
            .pid(pid)
            .block_size(PAGE_SIZE)
            .skip_blocks(window.start_block)
            .block_count(window.block_count)
            .trim_leading(window.byte_shift)
            .keep_bytes(window.window_bytes)
            .head(&tools.head)
            .compressor(&tools.compressor)
    }

    /// Process whose memory image is read
    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn block_size(mut self, bytes: u64) -> Self {
        self.block_size = Some(bytes);
        self
    }

    /// Blocks skipped before reading starts
    pub fn skip_blocks(mut self, blocks: u64) -> Self {
        self.skip_blocks = Some(blocks);
        self
    }

    /// Blocks read
    pub fn block_count(mut self, blocks: u64) -> Self {
        self.block_count = Some(blocks);
        self
    }

    /// Bytes dropped from the front of what was read
    pub fn trim_leading(mut self, bytes: u64) -> Self {
        self.trim_leading = Some(bytes);
        self
    }

    /// Bytes kept after trimming
    pub fn keep_bytes(mut self, bytes: u64) -> Self {
        self.keep_bytes = Some(bytes);
        self
    }

    pub fn head<S: Into<String>>(mut self, path: S) -> Self {
        self.head = Some(path.into());
        self
    }

    pub fn compressor<S: Into<String>>(mut self, path: S) -> Self {
        self.compressor = Some(path.into());
        self
    }

    /// Validate every stage and render the command line.
    pub fn build(self) -> Result<String> {
        let pid = required("pid", self.pid)?;
        if pid == 0 {
            return Err(invalid("pid must be non-zero"));
        }
        let block_size = positive("block size", self.block_size.unwrap_or(PAGE_SIZE))?;
        let skip_blocks = required("skip", self.skip_blocks)?;
        let block_count = positive("block count", required("block count", self.block_count)?)?;
        let trim_leading = self.trim_leading.unwrap_or(0);
        let keep_bytes = positive("byte count", required("byte count", self.keep_bytes)?)?;
        let head = required("head path", self.head)?;
        let compressor = required("compressor path", self.compressor)?;
        validate_remote_path(&head)?;
        validate_remote_path(&compressor)?;

        if trim_leading >= block_size {
            return Err(invalid("leading trim must lie within the first block"));
        }
        let span = block_size
            .checked_mul(block_count)
            .ok_or_else(|| invalid("read span overflows"))?;
        if span < trim_leading + keep_bytes {
            return Err(invalid("read span does not cover the requested bytes"));
        }

        // tail -c +N starts output at the N-th byte (1-based)
        Ok(format!(
            "dd if=/proc/{pid}/mem bs={block_size} skip={skip_blocks} count={block_count} 2>/dev/null \
             | tail -c +{first} | {head} -c {keep_bytes} | {compressor}",
            first = trim_leading + 1,
            head = shell_quote(&head),
            compressor = shell_quote(&compressor),
        ))
    }
}

fn required<T>(name: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| invalid(&format!("{name} not set")))
}

fn positive(name: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(invalid(&format!("{name} must be positive")));
    }
    Ok(value)
}

fn invalid(reason: &str) -> Error {
    Error::InvalidCommandArgument(reason.to_string())
}
