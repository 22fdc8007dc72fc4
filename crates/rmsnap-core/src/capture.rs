//! One-shot screenshot capture.
//!
//! [`Capture`] drives the stages strictly in order, one remote command at
//! a time:
//!
//! 1. classify the device (or take the configured model)
//! 2. find the UI process and the framebuffer offset
//! 3. check the remote tools
//! 4. carve and compress the framebuffer on the device
//! 5. decompress and validate the frame
//! 6. rebuild the image
//!
//! Any failure aborts the remaining stages. [`capture_and_close`] also
//! releases the session on every exit path.
//!
//! ## Example
//!
//! ```ignore
//! use rmsnap_core::{CaptureConfig, SshSession, capture_and_close};
//!
//! let config = CaptureConfig::builder()
//!     .host("10.11.99.1")
//!     .invert(true)
//!     .build();
//! let session = SshSession::connect("ssh", &config.user, &config.host)?;
//! let screenshot = capture_and_close(session, &config)?;
//! screenshot.image.save(config.output_path())?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::decode::StreamDecoder;
use crate::device::{DeviceModel, DeviceProfile, resolve_device};
use crate::error::Result;
use crate::extract::{FramebufferExtractor, PageWindow, RemoteTools};
use crate::memory::layout::{DISPLAY_DEVICE, UI_PROCESS};
use crate::memory::{FramebufferLocation, ProcessMemoryLocator};
use crate::reconstruct::{BoundingBox, ImageReconstructor, ToolbarState};
use crate::remote::RemoteShell;

/// Extension of the written image
pub const OUTPUT_EXTENSION: &str = "png";

/// Configuration for one capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Tablet address, only used to open the session
    pub host: String,
    pub user: String,
    /// Produce white strokes on a transparent background
    pub invert: bool,
    /// Output file name without extension
    pub output_name: String,
    /// Skip identity detection and use this model
    pub device: Option<DeviceModel>,
    pub tools: RemoteTools,
    pub ui_process: String,
    pub display_device: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            // USB network address of the tablet
            host: "10.11.99.1".to_string(),
            user: "root".to_string(),
            invert: false,
            output_name: "temp".to_string(),
            device: None,
            tools: RemoteTools::default(),
            ui_process: UI_PROCESS.to_string(),
            display_device: DISPLAY_DEVICE.to_string(),
        }
    }
}

impl CaptureConfig {
    /// Create a new configuration builder
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }

    /// `<output_name>.png`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.output_name, OUTPUT_EXTENSION))
    }
}

/// Builder for CaptureConfig
#[derive(Debug, Clone, Default)]
pub struct CaptureConfigBuilder {
    host: Option<String>,
    user: Option<String>,
    invert: Option<bool>,
    output_name: Option<String>,
    device: Option<DeviceModel>,
    tools: Option<RemoteTools>,
    ui_process: Option<String>,
    display_device: Option<String>,
}

impl CaptureConfigBuilder {
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn user<S: Into<String>>(mut self, user: S) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = Some(invert);
        self
    }

    pub fn output_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Force a device model instead of detecting it
    pub fn device(mut self, model: DeviceModel) -> Self {
        self.device = Some(model);
        self
    }

    pub fn tools(mut self, tools: RemoteTools) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn ui_process<S: Into<String>>(mut self, name: S) -> Self {
        self.ui_process = Some(name.into());
        self
    }

    pub fn display_device<S: Into<String>>(mut self, path: S) -> Self {
        self.display_device = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> CaptureConfig {
        let default = CaptureConfig::default();
        CaptureConfig {
            host: self.host.unwrap_or(default.host),
            user: self.user.unwrap_or(default.user),
            invert: self.invert.unwrap_or(default.invert),
            output_name: self.output_name.unwrap_or(default.output_name),
            device: self.device.or(default.device),
            tools: self.tools.unwrap_or(default.tools),
            ui_process: self.ui_process.unwrap_or(default.ui_process),
            display_device: self.display_device.unwrap_or(default.display_device),
        }
    }
}

/// Diagnostic summary of a capture
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub device: DeviceModel,
    pub profile: DeviceProfile,
    pub pid: u32,
    pub framebuffer_offset: String,
    pub location: FramebufferLocation,
    pub window: PageWindow,
    pub compressed_bytes: usize,
    pub toolbar: ToolbarState,
    pub bounds: BoundingBox,
    pub invert: bool,
}

impl CaptureReport {
    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// A finished capture
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub image: RgbaImage,
    pub report: CaptureReport,
}

pub struct Capture<'a> {
    config: &'a CaptureConfig,
}

impl<'a> Capture<'a> {
    pub fn new(config: &'a CaptureConfig) -> Self {
        Self { config }
    }

    fn device<S: RemoteShell>(&self, shell: &mut S) -> Result<DeviceModel> {
        match self.config.device {
            Some(model) => {
                info!("Using configured device {}", model);
                Ok(model)
            }
            None => resolve_device(shell),
        }
    }

    pub fn run<S: RemoteShell>(&self, shell: &mut S) -> Result<Screenshot> {
        let device = self.device(shell)?;
        let profile = device.profile();

        let locator =
            ProcessMemoryLocator::new(&self.config.ui_process, &self.config.display_device);
        let location = locator.locate(shell)?;

        self.config.tools.probe(shell)?;

        let window = PageWindow::new(location.offset, profile.window_bytes() as u64);
        debug!("Read window: {:?}", window);
        let compressed =
            FramebufferExtractor::new(&self.config.tools).extract(shell, location.pid, &window)?;

        let frame = StreamDecoder::new(profile.window_bytes()).decode(&compressed)?;
        let reconstructed =
            ImageReconstructor::new(profile, self.config.invert).reconstruct(&frame)?;

        let report = CaptureReport {
            device,
            profile,
            pid: location.pid,
            framebuffer_offset: format!("0x{:X}", location.offset),
            location,
            window,
            compressed_bytes: compressed.len(),
            toolbar: reconstructed.toolbar,
            bounds: reconstructed.bounds,
            invert: self.config.invert,
        };

        Ok(Screenshot {
            image: reconstructed.image,
            report,
        })
    }
}

/// Run a capture and close `shell` afterwards, whatever the outcome.
pub fn capture_and_close<S: RemoteShell>(
    mut shell: S,
    config: &CaptureConfig,
) -> Result<Screenshot> {
    let outcome = Capture::new(config).run(&mut shell);
    if let Err(e) = shell.close() {
        warn!("Failed to close remote session: {}", e);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::remote::MockShell;
    use image::{GrayImage, Luma, imageops};
    use lz4_flex::frame::FrameEncoder;
    use std::io::Write;

    const MAPS: &str = "\
00010000-00a1c000 r-xp 00000000 b3:02 4137       /usr/bin/xochitl
73939000-73bd2000 rw-s 00000000 00:06 118        /dev/fb0
73bd2000-7408a000 rw-p 00000000 00:00 0
7e9d8000-7e9f9000 rw-p 00000000 00:00 0          [stack]
";

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Native rm2 buffer showing a 100x50 black square on white paper
    fn square_frame() -> Vec<u8> {
        let mut page = GrayImage::from_pixel(1404, 1872, Luma([255]));
        for y in 900..950 {
            for x in 600..700 {
                page.put_pixel(x, y, Luma([0]));
            }
        }
        imageops::rotate90(&page).into_raw()
    }

    fn tablet(identity: &str, frame: &[u8]) -> MockShell {
        MockShell::new()
            .respond("cat /sys/devices/soc0/machine", format!("{identity}\n"))
            .respond("pidof xochitl", "412\n")
            .respond("cat /proc/412/maps", MAPS)
            .respond("test -x /opt/bin/head", "")
            .respond("test -x /opt/bin/lz4", "")
            .respond("dd if=/proc/412/mem", compress(frame))
    }

    #[test]
    fn test_end_to_end_rm2_square() {
        let config = CaptureConfig::default();
        let shell = tablet("reMarkable 2.0", &square_frame());

        let screenshot = capture_and_close(shell, &config).unwrap();
        assert_eq!(screenshot.image.dimensions(), (100, 50));
        assert!(screenshot.image.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        let report = &screenshot.report;
        assert_eq!(report.device, DeviceModel::Remarkable2);
        assert_eq!(report.pid, 412);
        assert_eq!(report.framebuffer_offset, "0x73BD2008");
        assert_eq!(report.window.start_block, 0x73bd2);
        assert_eq!(report.window.byte_shift, 8);
        assert_eq!(report.toolbar, ToolbarState::Closed);
    }

    #[test]
    fn test_stages_run_in_order() {
        let config = CaptureConfig::default();
        let mut shell = tablet("reMarkable 2.0", &square_frame());
        Capture::new(&config).run(&mut shell).unwrap();

        let order = ["soc0/machine", "pidof", "/proc/412/maps", "test -x", "dd if="];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| {
                shell
                    .commands
                    .iter()
                    .position(|c| c.contains(needle))
                    .unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_blank_page_fails_with_empty_content() {
        let config = CaptureConfig::default();
        let shell = tablet("reMarkable 2.0", &vec![255u8; 1872 * 1404]);
        assert!(matches!(
            capture_and_close(shell, &config),
            Err(Error::EmptyContent)
        ));
    }

    #[test]
    fn test_short_frame_fails_before_reconstruction() {
        let config = CaptureConfig::default();
        let shell = tablet("reMarkable 2.0", &vec![0u8; 1872 * 1404 - 1]);
        match capture_and_close(shell, &config) {
            Err(Error::FrameLengthMismatch { expected, actual }) => {
                assert_eq!(expected, 1872 * 1404);
                assert_eq!(actual, 1872 * 1404 - 1);
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.report)),
        }
    }

    #[test]
    fn test_session_closed_on_success_and_failure() {
        let config = CaptureConfig::default();

        let mut shell = tablet("reMarkable 2.0", &square_frame());
        capture_and_close(&mut shell, &config).unwrap();
        assert_eq!(shell.close_calls, 1);

        let mut shell = tablet("reMarkable 2.0", &vec![255u8; 1872 * 1404]);
        assert!(capture_and_close(&mut shell, &config).is_err());
        assert_eq!(shell.close_calls, 1);
    }

    #[test]
    fn test_unrecognized_device_stops_early() {
        let config = CaptureConfig::default();
        let mut shell = tablet("Kobo", &square_frame());
        assert!(matches!(
            Capture::new(&config).run(&mut shell),
            Err(Error::UnrecognizedDevice(_))
        ));
        assert!(!shell.issued("pidof"));
    }

    #[test]
    fn test_missing_tool_stops_before_extraction() {
        let config = CaptureConfig::default();
        let mut shell = MockShell::new()
            .respond("cat /sys/devices/soc0/machine", "reMarkable 2.0\n")
            .respond("pidof xochitl", "412\n")
            .respond("cat /proc/412/maps", MAPS)
            .respond("test -x /opt/bin/head", "")
            .respond_status("test -x /opt/bin/lz4", 1, "");
        assert!(matches!(
            Capture::new(&config).run(&mut shell),
            Err(Error::MissingTool(_))
        ));
        assert!(!shell.issued("dd if="));
    }

    #[test]
    fn test_configured_device_skips_identity_query() {
        let config = CaptureConfig::builder().device(DeviceModel::Remarkable2).build();
        let mut shell = tablet("unused", &square_frame());
        Capture::new(&config).run(&mut shell).unwrap();
        assert!(!shell.issued("soc0/machine"));
    }

    #[test]
    fn test_inverted_capture() {
        let config = CaptureConfig::builder().invert(true).build();
        let shell = tablet("reMarkable 2.0", &square_frame());
        let screenshot = capture_and_close(shell, &config).unwrap();
        assert_eq!(screenshot.image.dimensions(), (100, 50));
        assert!(screenshot.image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_builder_defaults() {
        let config = CaptureConfig::builder().output_name("page").build();
        assert_eq!(config.host, "10.11.99.1");
        assert_eq!(config.user, "root");
        assert!(!config.invert);
        assert_eq!(config.output_path(), PathBuf::from("page.png"));
        assert_eq!(config.tools, RemoteTools::default());
    }

    #[test]
    fn test_report_serializes() {
        let shell = tablet("reMarkable 2.0", &square_frame());
        let screenshot = capture_and_close(shell, &CaptureConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        screenshot.report.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["device"], "rm2");
        assert_eq!(json["framebuffer_offset"], "0x73BD2008");
        assert_eq!(json["bounds"]["min_x"], 600);
    }
}
