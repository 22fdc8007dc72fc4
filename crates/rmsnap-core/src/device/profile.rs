//! Device classification and display geometry.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::remote::RemoteShell;

/// System path whose content identifies the tablet generation
pub const IDENTITY_PATH: &str = "/sys/devices/soc0/machine";

/// Geometry of the raw display buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub display_width: u32,
    pub display_height: u32,
    pub bytes_per_pixel: u32,
}

impl DeviceProfile {
    /// reMarkable 1: RGB565 buffer, 1408 x 1872
    pub const REMARKABLE_1: Self = Self {
        display_width: 1408,
        display_height: 1872,
        bytes_per_pixel: 2,
    };

    /// reMarkable 2: 8-bit grayscale buffer, 1872 x 1404
    pub const REMARKABLE_2: Self = Self {
        display_width: 1872,
        display_height: 1404,
        bytes_per_pixel: 1,
    };

    pub fn pixel_count(&self) -> usize {
        self.display_width as usize * self.display_height as usize
    }

    /// Size of the raw frame in bytes
    pub fn window_bytes(&self) -> usize {
        self.pixel_count() * self.bytes_per_pixel as usize
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum DeviceModel {
    #[strum(serialize = "rm1")]
    #[serde(rename = "rm1")]
    Remarkable1,
    #[strum(serialize = "rm2")]
    #[serde(rename = "rm2")]
    Remarkable2,
}

impl DeviceModel {
    /// Classify a device-identity string.
    ///
    /// A `'1'` anywhere selects the first generation and takes priority
    /// over a `'2'`.
    pub fn classify(identity: &str) -> Result<Self> {
        if identity.contains('1') {
            Ok(Self::Remarkable1)
        } else if identity.contains('2') {
            Ok(Self::Remarkable2)
        } else {
            Err(Error::UnrecognizedDevice(identity.to_string()))
        }
    }

    pub fn profile(&self) -> DeviceProfile {
        match self {
            Self::Remarkable1 => DeviceProfile::REMARKABLE_1,
            Self::Remarkable2 => DeviceProfile::REMARKABLE_2,
        }
    }
}

/// Query the device identity and classify it.
pub fn resolve_device<S: RemoteShell>(shell: &mut S) -> Result<DeviceModel> {
    let output = shell.exec_checked(&format!("cat {IDENTITY_PATH}"))?;
    let text = output.stdout_text();
    let identity = text.lines().next().unwrap_or("").trim();
    debug!("Device identity: {:?}", identity);

    let model = DeviceModel::classify(identity)?;
    info!("Detected {} ({:?})", model, model.profile());
    Ok(model)
}
