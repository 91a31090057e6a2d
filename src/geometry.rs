// src/geometry.rs

//! Window size bookkeeping and image centering.

use log::debug;

/// Current window dimensions and the center point derived from them.
///
/// `center_x` and `center_y` always equal `width / 2` and `height / 2`
/// (floor division). For odd sizes this leaves the image up to one pixel
/// toward the top-left, which is the expected placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    width: u32,
    height: u32,
    center_x: u32,
    center_y: u32,
}

impl WindowGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        let mut geometry = WindowGeometry::default();
        geometry.update(width, height);
        geometry
    }

    /// Records a new window size and recomputes the center. Idempotent.
    pub fn update(&mut self, width: u32, height: u32) -> WindowGeometry {
        if self.width != width || self.height != height {
            debug!(
                "Window geometry {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
        }
        self.width = width;
        self.height = height;
        self.center_x = width / 2;
        self.center_y = height / 2;
        *self
    }

    /// Top-left corner at which an image of the given size is drawn so that
    /// it sits centered in the window. Negative when the image is larger than
    /// the window; the display server clips the overhang.
    pub fn blit_offset(&self, image_width: u32, image_height: u32) -> (i32, i32) {
        let x = i64::from(self.center_x) - i64::from(image_width / 2);
        let y = i64::from(self.center_y) - i64::from(image_height / 2);
        (saturate(x), saturate(y))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn center(&self) -> (u32, u32) {
        (self.center_x, self.center_y)
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
