//! Locate the display buffer inside the UI process.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::layout::{ALLOCATOR_HEADER, DISPLAY_DEVICE, UI_PROCESS};
use super::maps::{MemoryMap, MemoryRegion};
use crate::error::{Error, Result};
use crate::remote::{RemoteShell, shell_quote};

/// Where the pixel payload lives in the owning process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FramebufferLocation {
    pub pid: u32,
    /// Start of the display device mapping
    pub device_mapping: u64,
    /// Start of the heap block allocated right after the device mapping
    pub buffer_region: u64,
    /// Byte offset of the first pixel inside the process memory
    pub offset: u64,
}

/// Compute the pixel offset from a parsed memory map.
pub fn framebuffer_offset<'m>(
    map: &'m MemoryMap,
    device_path: &str,
    pid: u32,
) -> Result<(u64, &'m MemoryRegion)> {
    if !map.maps_path(device_path) {
        return Err(Error::DisplayMappingNotFound { pid });
    }
    let next = map
        .region_after_path(device_path)
        .ok_or(Error::NoRegionAfterDisplay { pid })?;
    Ok((next.start + ALLOCATOR_HEADER, next))
}

/// Parse `pidof` output: whitespace separated decimal PIDs, in order.
pub fn parse_pids(text: &str) -> Result<Vec<u32>> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<u32>().map_err(|e| {
                Error::InvalidCommandArgument(format!("invalid pid {:?}: {}", token, e))
            })
        })
        .collect()
}

pub struct ProcessMemoryLocator<'a> {
    process_name: &'a str,
    device_path: &'a str,
}

impl Default for ProcessMemoryLocator<'_> {
    fn default() -> Self {
        Self::new(UI_PROCESS, DISPLAY_DEVICE)
    }
}

impl<'a> ProcessMemoryLocator<'a> {
    pub fn new(process_name: &'a str, device_path: &'a str) -> Self {
        Self {
            process_name,
            device_path,
        }
    }

    /// List candidate PIDs of the UI process.
    ///
    /// `pidof` exits with status 1 when nothing matches; that is an empty
    /// list, not a failure.
    fn candidate_pids<S: RemoteShell>(&self, shell: &mut S) -> Result<Vec<u32>> {
        let command = format!("pidof {}", shell_quote(self.process_name));
        let output = shell.exec(&command)?;
        match output.status {
            0 => parse_pids(&output.stdout_text()),
            1 => Ok(Vec::new()),
            status => Err(Error::CommandFailed {
                command,
                status,
                stderr: output.stderr_text(),
            }),
        }
    }

    fn read_maps<S: RemoteShell>(&self, shell: &mut S, pid: u32) -> Result<Option<MemoryMap>> {
        let output = shell.exec(&format!("cat /proc/{}/maps", pid))?;
        if !output.success() {
            // Exited between pidof and now
            warn!("Could not read maps of pid {}: {}", pid, output.stderr_text());
            return Ok(None);
        }
        MemoryMap::parse(&output.stdout_text()).map(Some)
    }

    /// Find the first candidate process that maps the display device.
    ///
    /// Candidates are tried in `pidof` order.
    pub fn find_owning_process<S: RemoteShell>(&self, shell: &mut S) -> Result<(u32, MemoryMap)> {
        let pids = self.candidate_pids(shell)?;
        debug!("{} candidates: {:?}", self.process_name, pids);

        for pid in pids {
            let Some(map) = self.read_maps(shell, pid)? else {
                continue;
            };
            if map.maps_path(self.device_path) {
                debug!("pid {} maps {} ({} regions)", pid, self.device_path, map.len());
                return Ok((pid, map));
            }
            debug!("pid {} does not map {}", pid, self.device_path);
        }

        Err(Error::ProcessNotFound {
            process: self.process_name.to_string(),
            device: self.device_path.to_string(),
        })
    }

    /// Find the owning process and the pixel offset inside it.
    pub fn locate<S: RemoteShell>(&self, shell: &mut S) -> Result<FramebufferLocation> {
        let (pid, map) = self.find_owning_process(shell)?;
        let (offset, buffer_region) = framebuffer_offset(&map, self.device_path, pid)?;
        let device_mapping = map
            .find_path(self.device_path)
            .map(|r| r.start)
            .ok_or(Error::DisplayMappingNotFound { pid })?;

        let location = FramebufferLocation {
            pid,
            device_mapping,
            buffer_region: buffer_region.start,
            offset,
        };
        info!(
            "Framebuffer of pid {} at 0x{:X} (device mapping 0x{:X})",
            pid, offset, device_mapping
        );
        Ok(location)
    }
}
