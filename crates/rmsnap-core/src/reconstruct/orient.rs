//! Raw buffer to upright grayscale image.

use image::{GrayImage, imageops};

use crate::device::DeviceProfile;
use crate::error::{Error, Result};

/// Reduce one little-endian RGB565 pixel to 8-bit intensity.
pub fn rgb565_to_luma(pixel: u16) -> u8 {
    let r = u32::from((pixel >> 11) & 0x1f);
    let g = u32::from((pixel >> 5) & 0x3f);
    let b = u32::from(pixel & 0x1f);
    let r = (r * 255 + 15) / 31;
    let g = (g * 255 + 31) / 63;
    let b = (b * 255 + 15) / 31;
    ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
}

/// Interpret `bytes` as the device's native grid: `display_height` rows of
/// `display_width` pixels.
pub fn native_grid(bytes: &[u8], profile: &DeviceProfile) -> Result<GrayImage> {
    let intensities = match profile.bytes_per_pixel {
        1 => bytes.to_vec(),
        2 => bytes
            .chunks_exact(2)
            .map(|px| rgb565_to_luma(u16::from_le_bytes([px[0], px[1]])))
            .collect(),
        other => return Err(Error::UnsupportedPixelFormat(other)),
    };

    let actual = bytes.len();
    GrayImage::from_raw(profile.display_width, profile.display_height, intensities).ok_or(
        Error::FrameLengthMismatch {
            expected: profile.window_bytes(),
            actual,
        },
    )
}

/// Native memory layout rotated 90 degrees counter-clockwise, which is
/// the way the panel is held.
pub fn upright_image(bytes: &[u8], profile: &DeviceProfile) -> Result<GrayImage> {
    let grid = native_grid(bytes, profile)?;
    Ok(imageops::rotate270(&grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: DeviceProfile = DeviceProfile {
        display_width: 3,
        display_height: 2,
        bytes_per_pixel: 1,
    };

    #[test]
    fn test_rgb565_extremes() {
        assert_eq!(rgb565_to_luma(0xffff), 255);
        assert_eq!(rgb565_to_luma(0x0000), 0);
        // Pure green carries most of the luma weight
        assert!(rgb565_to_luma(0x07e0) > rgb565_to_luma(0xf800));
    }

    #[test]
    fn test_native_grid_is_row_major() {
        let grid = native_grid(&[1, 2, 3, 4, 5, 6], &TINY).unwrap();
        assert_eq!(grid.dimensions(), (3, 2));
        assert_eq!(grid.get_pixel(2, 0)[0], 3);
        assert_eq!(grid.get_pixel(0, 1)[0], 4);
    }

    #[test]
    fn test_upright_rotates_counter_clockwise() {
        // 1 2 3        3 6
        // 4 5 6   ->   2 5
        //              1 4
        let upright = upright_image(&[1, 2, 3, 4, 5, 6], &TINY).unwrap();
        assert_eq!(upright.dimensions(), (2, 3));
        assert_eq!(upright.as_raw(), &vec![3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_two_byte_pixels() {
        let profile = DeviceProfile {
            bytes_per_pixel: 2,
            ..TINY
        };
        let mut bytes = vec![0xffu8; 12];
        bytes[0] = 0;
        bytes[1] = 0;
        let grid = native_grid(&bytes, &profile).unwrap();
        assert_eq!(grid.get_pixel(0, 0)[0], 0);
        assert_eq!(grid.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_wrong_length_is_mismatch() {
        assert!(matches!(
            native_grid(&[1, 2, 3], &TINY),
            Err(Error::FrameLengthMismatch {
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_unsupported_depth() {
        let profile = DeviceProfile {
            bytes_per_pixel: 4,
            ..TINY
        };
        assert!(matches!(
            native_grid(&[0; 24], &profile),
            Err(Error::UnsupportedPixelFormat(4))
        ));
    }
}
