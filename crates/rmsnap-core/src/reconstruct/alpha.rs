//! Background transparency.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};

/// Intensity of untouched paper for the requested polarity
pub fn background_value(invert: bool) -> u8 {
    if invert { 0 } else { 255 }
}

/// 0 where the pixel is background, 255 everywhere else.
pub fn alpha_mask(img: &GrayImage, invert: bool) -> GrayImage {
    let background = background_value(invert);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] == background {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Expand to RGBA with the background made transparent.
pub fn apply_alpha(img: &GrayImage, invert: bool) -> RgbaImage {
    let mask = alpha_mask(img, invert);
    let mut rgba = DynamicImage::ImageLuma8(img.clone()).to_rgba8();
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel[3] = alpha[0];
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> GrayImage {
        GrayImage::from_fn(16, 16, |x, y| Luma([(y * 16 + x) as u8]))
    }

    #[test]
    fn test_white_is_transparent_when_not_inverted() {
        let img = gradient();
        let rgba = apply_alpha(&img, false);
        for (gray, out) in img.pixels().zip(rgba.pixels()) {
            let expected = if gray[0] == 255 { 0 } else { 255 };
            assert_eq!(out[3], expected);
            assert_eq!([out[0], out[1], out[2]], [gray[0]; 3]);
        }
    }

    #[test]
    fn test_black_is_transparent_when_inverted() {
        let img = gradient();
        let rgba = apply_alpha(&img, true);
        for (gray, out) in img.pixels().zip(rgba.pixels()) {
            let expected = if gray[0] == 0 { 0 } else { 255 };
            assert_eq!(out[3], expected);
        }
    }

    #[test]
    fn test_mask_dimensions_follow_image() {
        let img = GrayImage::new(7, 3);
        assert_eq!(alpha_mask(&img, true).dimensions(), (7, 3));
        assert!(alpha_mask(&img, true).pixels().all(|p| p[0] == 0));
        assert!(alpha_mask(&img, false).pixels().all(|p| p[0] == 255));
    }
}
