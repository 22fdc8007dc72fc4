//! Turn a raw frame into the final transparent image.
//!
//! Steps, in order:
//!
//! | Step     | Module    | Effect                                           |
//! |----------|-----------|--------------------------------------------------|
//! | orient   | `orient`  | native grid, rotated upright                     |
//! | de-chrome| `toolbar` | menu panel / indicator painted white             |
//! | crop     | `crop`    | cut to the drawn content, optionally inverted    |
//! | alpha    | `alpha`   | background made transparent, RGBA output         |

mod alpha;
mod crop;
mod orient;
mod toolbar;

pub use alpha::{alpha_mask, apply_alpha, background_value};
pub use crop::{BoundingBox, crop_image, nonzero_bounds};
pub use orient::{native_grid, rgb565_to_luma, upright_image};
pub use toolbar::{
    CLOSE_BUTTON, MENU_INDICATOR, MENU_PANEL_WIDTH, MENU_PROBE, PixelRect, ToolbarState,
    detect_toolbar, remove_toolbar,
};

use image::RgbaImage;
use tracing::{debug, info};

use crate::decode::RawFrame;
use crate::device::DeviceProfile;
use crate::error::Result;

/// Result of a reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstructed {
    pub image: RgbaImage,
    pub toolbar: ToolbarState,
    /// Crop rectangle in upright page coordinates
    pub bounds: BoundingBox,
}

pub struct ImageReconstructor {
    profile: DeviceProfile,
    invert: bool,
}

impl ImageReconstructor {
    pub fn new(profile: DeviceProfile, invert: bool) -> Self {
        Self { profile, invert }
    }

    pub fn reconstruct(&self, frame: &RawFrame) -> Result<Reconstructed> {
        let mut page = upright_image(frame.as_bytes(), &self.profile)?;
        debug!("Upright page: {}x{}", page.width(), page.height());

        let toolbar = remove_toolbar(&mut page);
        debug!("Toolbar {:?}", toolbar);

        let (cropped, bounds) = crop_image(&page, self.invert)?;
        info!(
            "Cropped to {}x{} at ({}, {})",
            bounds.width(),
            bounds.height(),
            bounds.min_x,
            bounds.min_y
        );

        Ok(Reconstructed {
            image: apply_alpha(&cropped, self.invert),
            toolbar,
            bounds,
        })
    }
}
