// src/backends/x11/pixel_format.rs

//! Packing RGB colors into the pixel layout of a TrueColor visual.

use crate::color::Color;
use crate::image_loader::ImageBuffer;

/// Channel masks of a TrueColor visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    red_mask: u64,
    green_mask: u64,
    blue_mask: u64,
}

impl PixelFormat {
    /// `0x00RRGGBB`, the common 24/32-bit layout.
    pub const XRGB8888: PixelFormat = PixelFormat {
        red_mask: 0xFF_0000,
        green_mask: 0x00_FF00,
        blue_mask: 0x00_00FF,
    };

    /// Builds a format from visual masks.
    ///
    /// Returns `None` unless every mask is a single run of 1 to 16 set bits.
    pub fn from_masks(red_mask: u64, green_mask: u64, blue_mask: u64) -> Option<Self> {
        let usable = |mask: u64| {
            if mask == 0 {
                return false;
            }
            let bits = mask >> mask.trailing_zeros();
            bits <= 0xFFFF && bits & (bits + 1) == 0
        };
        (usable(red_mask) && usable(green_mask) && usable(blue_mask)).then_some(PixelFormat {
            red_mask,
            green_mask,
            blue_mask,
        })
    }

    /// Packs `color`, scaling each 8-bit channel to the width of its mask.
    pub fn encode(&self, color: Color) -> u64 {
        scale_channel(color.r, self.red_mask)
            | scale_channel(color.g, self.green_mask)
            | scale_channel(color.b, self.blue_mask)
    }

    /// Encodes `image` as XImage data: `bytes_per_pixel` bytes per pixel in
    /// the given byte order, rows `stride` bytes apart. Alpha is dropped.
    pub fn encode_image(
        &self,
        image: &ImageBuffer,
        bytes_per_pixel: usize,
        stride: usize,
        msb_first: bool,
    ) -> Vec<u8> {
        let mut data = vec![0u8; stride * image.height() as usize];
        for (y, row) in data.chunks_exact_mut(stride).enumerate() {
            let pixels = row.chunks_exact_mut(bytes_per_pixel);
            for (x, dst) in pixels.take(image.width() as usize).enumerate() {
                let p = image.get_pixel(x as u32, y as u32);
                store_pixel(dst, self.encode(Color::rgb(p[0], p[1], p[2])), msb_first);
            }
        }
        data
    }
}

fn scale_channel(value: u8, mask: u64) -> u64 {
    let shift = mask.trailing_zeros();
    let max = mask >> shift;
    ((u64::from(value) * max + 127) / 255) << shift
}

fn store_pixel(dst: &mut [u8], pixel: u64, msb_first: bool) {
    let last = dst.len() - 1;
    for (i, byte) in dst.iter_mut().enumerate() {
        let shift = if msb_first { (last - i) * 8 } else { i * 8 };
        *byte = (pixel >> shift) as u8;
    }
}
