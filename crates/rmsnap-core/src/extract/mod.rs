//! Carve the framebuffer out of the UI process memory.

mod command;
mod window;

pub use command::ExtractionCommandBuilder;
pub use window::PageWindow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::remote::{RemoteShell, shell_quote, validate_remote_path};

/// Executables the extraction pipeline needs on the device.
///
/// The stock busybox `head` cannot count bytes and the firmware ships no
/// compressor, so both come from a separate package install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTools {
    pub head: String,
    pub compressor: String,
}

impl Default for RemoteTools {
    fn default() -> Self {
        Self {
            head: "/opt/bin/head".to_string(),
            compressor: "/opt/bin/lz4".to_string(),
        }
    }
}

impl RemoteTools {
    /// Fail with [`Error::MissingTool`] for the first tool that is not an
    /// executable on the device.
    pub fn probe<S: RemoteShell>(&self, shell: &mut S) -> Result<()> {
        for path in [&self.head, &self.compressor] {
            validate_remote_path(path)?;
            let output = shell.exec(&format!("test -x {}", shell_quote(path)))?;
            if !output.success() {
                return Err(Error::MissingTool(path.clone()));
            }
            debug!("Found {}", path);
        }
        Ok(())
    }
}

pub struct FramebufferExtractor<'a> {
    tools: &'a RemoteTools,
}

impl<'a> FramebufferExtractor<'a> {
    pub fn new(tools: &'a RemoteTools) -> Self {
        Self { tools }
    }

    /// Read `window` out of the memory of `pid`, compressed.
    ///
    /// Issued as a single remote command.
    pub fn extract<S: RemoteShell>(
        &self,
        shell: &mut S,
        pid: u32,
        window: &PageWindow,
    ) -> Result<Vec<u8>> {
        let command = ExtractionCommandBuilder::from_window(pid, window, self.tools).build()?;
        debug!(
            "Reading {} pages from page {} of pid {}",
            window.block_count, window.start_block, pid
        );

        let output = shell.exec_checked(&command)?;
        info!(
            "Received {} compressed bytes for a {} byte frame",
            output.stdout.len(),
            window.window_bytes
        );
        Ok(output.stdout)
    }
}
