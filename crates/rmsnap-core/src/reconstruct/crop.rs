//! Crop a page to the strokes drawn on it.

use image::{GrayImage, imageops};
use serde::Serialize;

use crate::error::{Error, Result};

/// Smallest rectangle holding every drawn pixel, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Bounding box of the non-zero pixels of `img`.
pub fn nonzero_bounds(img: &GrayImage) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        match bounds.as_mut() {
            Some(b) => b.include(x, y),
            None => {
                bounds = Some(BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }
    bounds
}

/// Crop `img` to its drawn content.
///
/// With `invert` the result is returned with inverted intensities (white
/// strokes on black).
pub fn crop_image(img: &GrayImage, invert: bool) -> Result<(GrayImage, BoundingBox)> {
    let mut work = img.clone();
    imageops::invert(&mut work);
    let bounds = nonzero_bounds(&work).ok_or(Error::EmptyContent)?;
    if !invert {
        imageops::invert(&mut work);
    }

    let cropped = imageops::crop_imm(
        &work,
        bounds.min_x,
        bounds.min_y,
        bounds.width(),
        bounds.height(),
    )
    .to_image();
    Ok((cropped, bounds))
}
