//! Parser for `/proc/<pid>/maps` listings.
//!
//! Each line has the form
//!
//! ```text
//! 00400000-0040b000 r-xp 00000000 b3:02 1234   /usr/bin/xochitl
//! ```
//!
//! i.e. a hex address range, four permission flags, the hex file offset,
//! the backing device, the inode and an optional path that may contain
//! spaces.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub shared: bool,
}

impl FromStr for Permissions {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let flags: Vec<char> = s.chars().collect();
        if flags.len() != 4 {
            return Err(format!("permissions must be 4 flags, got {:?}", s));
        }

        let flag = |index: usize, set: char| -> std::result::Result<bool, String> {
            match flags[index] {
                c if c == set => Ok(true),
                '-' => Ok(false),
                c => Err(format!("unexpected permission flag {:?} in {:?}", c, s)),
            }
        };

        let shared = match flags[3] {
            's' => true,
            'p' => false,
            c => return Err(format!("unexpected sharing flag {:?} in {:?}", c, s)),
        };

        Ok(Self {
            read: flag(0, 'r')?,
            write: flag(1, 'w')?,
            execute: flag(2, 'x')?,
            shared,
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' },
        )
    }
}

/// One mapped address range of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub permissions: Permissions,
    pub offset: u64,
    pub device: String,
    pub inode: u64,
    /// Backing file or pseudo-path (`[heap]`, `[stack]`); `None` for
    /// anonymous mappings
    pub path: Option<String>,
}

impl MemoryRegion {
    pub fn is_backed_by(&self, path: &str) -> bool {
        self.path.as_deref() == Some(path)
    }

    fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedMemoryMap {
            line: line_no,
            reason,
        };

        let mut rest = line;
        let mut fields = [""; 5];
        for (index, field) in fields.iter_mut().enumerate() {
            let trimmed = rest.trim_start();
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            if end == 0 {
                return Err(malformed(format!(
                    "expected at least 5 fields, found {}",
                    index
                )));
            }
            *field = &trimmed[..end];
            rest = &trimmed[end..];
        }
        let [range, permissions, offset, device, inode] = fields;

        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| malformed(format!("address range without '-': {:?}", range)))?;
        let start = parse_hex(start).map_err(&malformed)?;
        let end = parse_hex(end).map_err(&malformed)?;
        if end < start {
            return Err(malformed(format!(
                "range ends before it starts: {:#x}-{:#x}",
                start, end
            )));
        }

        let path = rest.trim();

        Ok(Self {
            start,
            end,
            permissions: permissions.parse::<Permissions>().map_err(&malformed)?,
            offset: parse_hex(offset).map_err(&malformed)?,
            device: device.to_string(),
            inode: inode
                .parse()
                .map_err(|e| malformed(format!("invalid inode {:?}: {}", inode, e)))?,
            path: (!path.is_empty()).then(|| path.to_string()),
        })
    }
}

fn parse_hex(s: &str) -> std::result::Result<u64, String> {
    u64::from_str_radix(s, 16).map_err(|e| format!("invalid hex value {:?}: {}", s, e))
}

/// Typed memory-map table of one process, ordered by start address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    /// Parse a full maps listing. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut regions: Vec<MemoryRegion> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let region = MemoryRegion::parse_line(line, index + 1)?;

            if let Some(previous) = regions.last() {
                if region.start < previous.start {
                    return Err(Error::MalformedMemoryMap {
                        line: index + 1,
                        reason: format!(
                            "region {:#x} listed after {:#x}",
                            region.start, previous.start
                        ),
                    });
                }
            }
            regions.push(region);
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether any region is backed by `path`
    pub fn maps_path(&self, path: &str) -> bool {
        self.regions.iter().any(|r| r.is_backed_by(path))
    }

    /// First region backed by `path`
    pub fn find_path(&self, path: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.is_backed_by(path))
    }

    /// Region that follows the mapping of `path` in address order.
    ///
    /// A file mapped as several adjacent regions counts as one mapping;
    /// the region after the last of them is returned.
    pub fn region_after_path(&self, path: &str) -> Option<&MemoryRegion> {
        let first = self.regions.iter().position(|r| r.is_backed_by(path))?;
        self.regions[first..]
            .iter()
            .position(|r| !r.is_backed_by(path))
            .map(|skip| &self.regions[first + skip])
    }
}
