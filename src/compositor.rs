// src/compositor.rs

//! Puts the image on the window without alpha blending.
//!
//! Non-opaque pixels are first replaced by an opaque neutral color. The
//! result is rendered to an off-screen surface which then serves as both mask
//! and source for a four-step bitwise combine against the window:
//!
//! 1. `dst &= !mask` clears the footprint,
//! 2. `scratch = mask`,
//! 3. `scratch &= src`,
//! 4. `dst |= scratch`.
//!
//! Once every pixel is opaque the mask and the source are the same surface,
//! so the sequence amounts to a plain overwrite of the footprint; the final
//! centered copy writes the same pixels again.

use crate::backends::{Drawable, Driver, RasterOp, Rect, SurfaceId};
use crate::color::Color;
use crate::error::Result;
use crate::geometry::WindowGeometry;
use crate::image_loader::ImageBuffer;

use log::{debug, trace};

pub struct Compositor {
    neutral_fill: Color,
}

impl Compositor {
    pub fn new(neutral_fill: Color) -> Self {
        Compositor { neutral_fill }
    }

    /// Neutralizes `image` (first call only), composites it and copies it to
    /// the window centered on `geometry`. Every surface created here is freed
    /// before returning, whether or not drawing succeeded.
    pub fn draw(
        &self,
        driver: &mut dyn Driver,
        image: &mut ImageBuffer,
        geometry: &WindowGeometry,
    ) -> Result<()> {
        image.normalize(self.neutral_fill);

        let (width, height) = (image.width(), image.height());
        let (dst_x, dst_y) = geometry.blit_offset(width, height);
        debug!(
            "Compositing {}x{} image at ({}, {}) in {}x{} window",
            width,
            height,
            dst_x,
            dst_y,
            geometry.width(),
            geometry.height()
        );

        let surface = driver.create_surface(width, height)?;
        let result = self.render_and_blit(driver, image, surface, dst_x, dst_y);
        driver.free_surface(surface);
        result
    }

    fn render_and_blit(
        &self,
        driver: &mut dyn Driver,
        image: &ImageBuffer,
        surface: SurfaceId,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        driver.put_image(surface, image)?;

        let area = Rect::sized(image.width(), image.height());
        mask_combine(driver, surface, surface, area, dst_x, dst_y)?;

        with_raster_op(driver, RasterOp::Copy, |driver| {
            driver.copy_area(Drawable::Surface(surface), Drawable::Window, area, dst_x, dst_y)
        })
    }
}

/// Combines `source` into the window through `mask` using only bitwise ops.
/// The drawing context's raster op is restored and the scratch surface freed
/// on every path.
pub fn mask_combine(
    driver: &mut dyn Driver,
    source: SurfaceId,
    mask: SurfaceId,
    area: Rect,
    dst_x: i32,
    dst_y: i32,
) -> Result<()> {
    let previous = driver.raster_op();
    let result = combine_steps(driver, source, mask, area, dst_x, dst_y);
    driver.set_raster_op(previous);
    result
}

fn combine_steps(
    driver: &mut dyn Driver,
    source: SurfaceId,
    mask: SurfaceId,
    area: Rect,
    dst_x: i32,
    dst_y: i32,
) -> Result<()> {
    trace!("mask combine: clearing footprint");
    driver.set_raster_op(RasterOp::AndInverted);
    driver.copy_area(Drawable::Surface(mask), Drawable::Window, area, dst_x, dst_y)?;

    let scratch = driver.create_surface(area.width, area.height)?;
    let result = (|| {
        let local = Rect::sized(area.width, area.height);

        trace!("mask combine: copying mask into scratch");
        driver.set_raster_op(RasterOp::Copy);
        driver.copy_area(Drawable::Surface(mask), Drawable::Surface(scratch), area, 0, 0)?;

        trace!("mask combine: coloring scratch with source");
        driver.set_raster_op(RasterOp::And);
        driver.copy_area(Drawable::Surface(source), Drawable::Surface(scratch), area, 0, 0)?;

        trace!("mask combine: merging scratch into window");
        driver.set_raster_op(RasterOp::Or);
        driver.copy_area(Drawable::Surface(scratch), Drawable::Window, local, dst_x, dst_y)
    })();
    driver.free_surface(scratch);
    result
}

/// Runs `f` with `op` set on the drawing context, restoring the previous op
/// afterwards.
fn with_raster_op<T>(
    driver: &mut dyn Driver,
    op: RasterOp,
    f: impl FnOnce(&mut dyn Driver) -> Result<T>,
) -> Result<T> {
    let previous = driver.raster_op();
    if previous == op {
        return f(driver);
    }
    driver.set_raster_op(op);
    let result = f(driver);
    driver.set_raster_op(previous);
    result
}
