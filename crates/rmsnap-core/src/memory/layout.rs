//! Memory layout constants for the tablet's UI process
//!
//! The UI process maps the display device and then allocates the buffer it
//! actually draws into as an ordinary heap block directly after that
//! mapping. These constants locate that block.

/// Name of the UI process that owns the display buffer
pub const UI_PROCESS: &str = "xochitl";

/// Display device file the UI process maps
pub const DISPLAY_DEVICE: &str = "/dev/fb0";

/// Allocator record header preceding the pixel payload (bytes)
pub const ALLOCATOR_HEADER: u64 = 8;

/// Granularity of the remote memory reads (bytes)
pub const PAGE_SIZE: u64 = 4096;
