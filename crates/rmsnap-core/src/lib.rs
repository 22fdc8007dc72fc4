//! # rmsnap-core
//!
//! Core library for taking screenshots of a reMarkable tablet over ssh.
//!
//! This crate provides:
//! - Device classification and display geometry
//! - `/proc/<pid>/maps` parsing and framebuffer location
//! - Page-granular extraction of the framebuffer on the device
//! - LZ4 frame decoding with size validation
//! - Image reconstruction: orientation, toolbar removal, cropping, alpha
//!
//! The remote side is reached through the [`RemoteShell`] trait;
//! [`SshSession`] implements it with the system OpenSSH client.

pub mod capture;
pub mod decode;
pub mod device;
pub mod error;
pub mod extract;
pub mod memory;
pub mod reconstruct;
pub mod remote;

pub use capture::{
    Capture, CaptureConfig, CaptureConfigBuilder, CaptureReport, OUTPUT_EXTENSION, Screenshot,
    capture_and_close,
};
pub use decode::{RawFrame, StreamDecoder};
pub use device::{DeviceModel, DeviceProfile, resolve_device};
pub use error::{Error, Result};
pub use extract::{ExtractionCommandBuilder, FramebufferExtractor, PageWindow, RemoteTools};
pub use memory::{
    FramebufferLocation, MemoryMap, MemoryRegion, Permissions, ProcessMemoryLocator,
    framebuffer_offset, parse_pids,
};
pub use reconstruct::{
    BoundingBox, ImageReconstructor, Reconstructed, ToolbarState, crop_image, remove_toolbar,
};
pub use remote::{CommandOutput, RemoteShell, SshSession, shell_quote};
