// src/color.rs

//! Opaque RGB colors and their packed pixel form.

use serde::{Deserialize, Serialize};

/// An opaque 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Window background of the viewer (`#444444`).
    pub const BACKGROUND: Color = Color::rgb(0x44, 0x44, 0x44);
    /// Substitute for every pixel that is not fully opaque (`#808080`).
    pub const NEUTRAL_GRAY: Color = Color::rgb(0x80, 0x80, 0x80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Packs the color as `0x00RRGGBB`, the layout of a 24-bit TrueColor pixel.
    #[inline]
    pub const fn to_xrgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Opaque RGBA form, as stored in decoded images.
    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xFF]
    }

    /// Each channel widened to the 16-bit range Xlib's `XColor` expects.
    #[inline]
    pub const fn to_x_channels(self) -> (u16, u16, u16) {
        (
            self.r as u16 * 257,
            self.g as u16 * 257,
            self.b as u16 * 257,
        )
    }
}
