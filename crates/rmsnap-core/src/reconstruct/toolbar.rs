//! Blank out the notebook UI chrome.
//!
//! Coordinates are in the upright image, with the origin at the top-left
//! corner of the panel. They describe xochitl's toolbar at the panel's
//! native 226 DPI and apply to both device generations unchanged.

use std::ops::Range;

use image::{GrayImage, Luma};
use serde::Serialize;

/// An axis-aligned pixel rectangle, end-exclusive on both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRect {
    pub x: Range<u32>,
    pub y: Range<u32>,
}

impl PixelRect {
    /// The part of the rectangle inside a `width` x `height` image
    fn clamped(&self, width: u32, height: u32) -> Self {
        Self {
            x: self.x.start.min(width)..self.x.end.min(width),
            y: self.y.start.min(height)..self.y.end.min(height),
        }
    }

    fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

/// Inside the hamburger button; solid black only while the menu is open
pub const MENU_PROBE: PixelRect = PixelRect {
    x: 52..58,
    y: 52..58,
};

/// Width of the open tool panel along the left edge
pub const MENU_PANEL_WIDTH: u32 = 120;

/// "Close document" cross in the top-right corner, shown with the menu
pub const CLOSE_BUTTON: PixelRect = PixelRect {
    x: 1324..1364,
    y: 39..80,
};

/// Round menu button left on screen while the menu is collapsed
pub const MENU_INDICATOR: PixelRect = PixelRect {
    x: 40..81,
    y: 39..81,
};

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolbarState {
    Open,
    Closed,
}

pub fn detect_toolbar(img: &GrayImage) -> ToolbarState {
    let probe = MENU_PROBE.clamped(img.width(), img.height());
    if probe.is_empty() {
        return ToolbarState::Closed;
    }

    let all_black = probe
        .y
        .clone()
        .all(|y| probe.x.clone().all(|x| img.get_pixel(x, y)[0] == BLACK));
    if all_black {
        ToolbarState::Open
    } else {
        ToolbarState::Closed
    }
}

fn fill(img: &mut GrayImage, rect: &PixelRect, value: u8) {
    let rect = rect.clamped(img.width(), img.height());
    for y in rect.y.clone() {
        for x in rect.x.clone() {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

/// Paint the toolbar white and report what was found.
pub fn remove_toolbar(img: &mut GrayImage) -> ToolbarState {
    let state = detect_toolbar(img);
    match state {
        ToolbarState::Open => {
            let panel = PixelRect {
                x: 0..MENU_PANEL_WIDTH,
                y: 0..img.height(),
            };
            fill(img, &panel, WHITE);
            fill(img, &CLOSE_BUTTON, WHITE);
        }
        ToolbarState::Closed => fill(img, &MENU_INDICATOR, WHITE),
    }
    state
}
