//! Writing a finished capture to disk.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use rmsnap_core::Screenshot;
use tracing::info;

/// Top-level context for a failed capture
fn failure_context(err: &rmsnap_core::Error) -> &'static str {
    if err.is_device_precondition() {
        "Device precondition failed"
    } else {
        "Capture failed"
    }
}

/// Persist the outcome of a capture.
///
/// Nothing is written unless the capture succeeded. The report, when
/// requested, is written after the image.
pub fn write_outcome(
    outcome: rmsnap_core::Result<Screenshot>,
    image_path: &Path,
    report_path: Option<&Path>,
) -> Result<Screenshot> {
    let screenshot = outcome.map_err(|e| {
        let context = failure_context(&e);
        anyhow::Error::new(e).context(context)
    })?;

    save_image(&screenshot.image, image_path)?;

    if let Some(path) = report_path {
        screenshot
            .report
            .save(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Saved capture report to {}", path.display());
    }

    Ok(screenshot)
}

fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "Saved {}x{} screenshot to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
