// src/backends/x11/graphics.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use crate::backends::{Drawable, RasterOp, Rect, SurfaceId};
use crate::error::{Result, ViewerError};
use crate::image_loader::ImageBuffer;

use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::ptr;

// X11 library imports
use libc::{c_char, c_int, c_uint};
use x11::xlib;

// --- RAII Wrappers for X11 Resources ---

/// Wraps an X11 `GC` (Graphics Context) to ensure it's freed via `XFreeGC` on drop.
#[derive(Debug)]
pub(super) struct SafeGc {
    gc: xlib::GC,
    display: *mut xlib::Display,
}

impl SafeGc {
    fn new(gc: xlib::GC, display_ptr: *mut xlib::Display) -> Self {
        Self {
            gc,
            display: display_ptr,
        }
    }

    #[inline]
    fn raw(&self) -> xlib::GC {
        self.gc
    }

    /// Frees the GC now. Safe to call more than once.
    fn free(&mut self) {
        if !self.gc.is_null() && !self.display.is_null() {
            trace!("Freeing GC: {:p}", self.gc);
            // SAFETY: gc was created on this display and not freed yet.
            unsafe { xlib::XFreeGC(self.display, self.gc) };
        }
        self.gc = ptr::null_mut();
    }
}

impl Drop for SafeGc {
    fn drop(&mut self) {
        self.free();
    }
}

/// X11 GC function for a raster op.
pub(super) fn gc_function(op: RasterOp) -> c_int {
    match op {
        RasterOp::Copy => xlib::GXcopy,
        RasterOp::And => xlib::GXand,
        RasterOp::AndInverted => xlib::GXandInverted,
        RasterOp::Or => xlib::GXor,
    }
}

/// Surface handle for a pixmap. XIDs are at most 32 bits wide whatever the
/// width of `c_ulong`.
fn surface_id(pixmap: xlib::Pixmap) -> SurfaceId {
    SurfaceId(u64::from(pixmap))
}

/// Drawing state tied to the window: one GC and the pixmaps handed out as
/// surfaces.
#[derive(Debug)]
pub(super) struct Graphics {
    gc: SafeGc,
    window: xlib::Window,
    raster_op: RasterOp,
    pixmaps: HashMap<SurfaceId, xlib::Pixmap>,
}

impl Graphics {
    pub(super) fn new(connection: &Connection, window: xlib::Window) -> Result<Self> {
        let display = connection.display();
        // SAFETY: display and window are valid. Zero value mask: defaults,
        // which include GXcopy.
        let gc = unsafe { xlib::XCreateGC(display, window, 0, ptr::null_mut()) };
        if gc.is_null() {
            return Err(ViewerError::ResourceAllocation("XCreateGC".to_string()));
        }
        // XCopyArea would otherwise queue a NoExpose event per call.
        // SAFETY: gc was just created on this display.
        unsafe { xlib::XSetGraphicsExposures(display, gc, xlib::False) };
        debug!("GC created: {:p}", gc);

        Ok(Self {
            gc: SafeGc::new(gc, display),
            window,
            raster_op: RasterOp::Copy,
            pixmaps: HashMap::new(),
        })
    }

    fn resolve(&self, drawable: Drawable) -> Result<xlib::Drawable> {
        match drawable {
            Drawable::Window => Ok(self.window),
            Drawable::Surface(id) => self.pixmaps.get(&id).copied().ok_or_else(|| {
                ViewerError::ResourceAllocation(format!("unknown surface {:?}", id))
            }),
        }
    }

    pub(super) fn create_pixmap(
        &mut self,
        connection: &Connection,
        width: u32,
        height: u32,
    ) -> Result<SurfaceId> {
        // Zero-sized pixmaps are a protocol error; keep at least one pixel.
        let (width, height) = (width.max(1), height.max(1));
        // SAFETY: display and window are valid.
        let pixmap = unsafe {
            xlib::XCreatePixmap(
                connection.display(),
                self.window,
                width as c_uint,
                height as c_uint,
                connection.depth() as c_uint,
            )
        };
        if pixmap == 0 {
            return Err(ViewerError::ResourceAllocation("XCreatePixmap".to_string()));
        }
        let id = surface_id(pixmap);
        self.pixmaps.insert(id, pixmap);
        trace!("Pixmap {} created ({}x{})", pixmap, width, height);
        Ok(id)
    }

    /// Uploads the image into the pixmap through a client-side ZPixmap XImage.
    ///
    /// Xlib picks bits per pixel and row stride for the connection's depth;
    /// pixels are packed to match, using the visual's channel masks.
    pub(super) fn put_image(
        &mut self,
        connection: &Connection,
        surface: SurfaceId,
        image: &ImageBuffer,
    ) -> Result<()> {
        let pixmap = self.resolve(Drawable::Surface(surface))?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Ok(());
        }

        // SAFETY: no data is attached yet, so XCreateImage only fills in the
        // layout for this depth.
        let ximage = unsafe {
            xlib::XCreateImage(
                connection.display(),
                connection.visual(),
                connection.depth() as c_uint,
                xlib::ZPixmap,
                0,
                ptr::null_mut(),
                width as c_uint,
                height as c_uint,
                32,
                0,
            )
        };
        if ximage.is_null() {
            return Err(ViewerError::ResourceAllocation("XCreateImage".to_string()));
        }
        // SAFETY: ximage is non-null and was just created.
        let (bits_per_pixel, stride, byte_order) = unsafe {
            (
                (*ximage).bits_per_pixel,
                (*ximage).bytes_per_line,
                (*ximage).byte_order,
            )
        };
        if !matches!(bits_per_pixel, 16 | 24 | 32) || stride <= 0 {
            // SAFETY: data is still null, so Xlib frees only the struct.
            unsafe { xlib::XDestroyImage(ximage) };
            return Err(ViewerError::UnsupportedVisual(format!(
                "{} bits per pixel at depth {}",
                bits_per_pixel,
                connection.depth()
            )));
        }
        let mut data = connection.pixel_format().encode_image(
            image,
            bits_per_pixel as usize / 8,
            stride as usize,
            byte_order == xlib::MSBFirst,
        );

        // SAFETY: `data` outlives the XImage, whose data pointer is cleared
        // before XDestroyImage so Xlib does not free memory it does not own.
        unsafe {
            (*ximage).data = data.as_mut_ptr() as *mut c_char;
            xlib::XPutImage(
                connection.display(),
                pixmap,
                self.gc.raw(),
                ximage,
                0,
                0,
                0,
                0,
                width as c_uint,
                height as c_uint,
            );
            (*ximage).data = ptr::null_mut();
            xlib::XDestroyImage(ximage);
        }
        trace!(
            "Uploaded {}x{} image to pixmap {} ({} bpp, stride {})",
            width,
            height,
            pixmap,
            bits_per_pixel,
            stride
        );
        Ok(())
    }

    #[inline]
    pub(super) fn raster_op(&self) -> RasterOp {
        self.raster_op
    }

    pub(super) fn set_raster_op(&mut self, connection: &Connection, op: RasterOp) {
        if self.gc.raw().is_null() {
            warn!("set_raster_op called after the GC was freed.");
            return;
        }
        // SAFETY: valid display and GC.
        unsafe { xlib::XSetFunction(connection.display(), self.gc.raw(), gc_function(op)) };
        self.raster_op = op;
    }

    pub(super) fn copy_area(
        &self,
        connection: &Connection,
        src: Drawable,
        dst: Drawable,
        area: Rect,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        let (src_id, dst_id) = (self.resolve(src)?, self.resolve(dst)?);
        trace!(
            "XCopyArea {:?} -> {:?} {:?} at ({}, {}) with {:?}",
            src,
            dst,
            area,
            dst_x,
            dst_y,
            self.raster_op
        );
        // SAFETY: both drawables belong to this display; the server clips
        // anything outside them, including negative destinations.
        unsafe {
            xlib::XCopyArea(
                connection.display(),
                src_id,
                dst_id,
                self.gc.raw(),
                area.x,
                area.y,
                area.width as c_uint,
                area.height as c_uint,
                dst_x,
                dst_y,
            );
        }
        Ok(())
    }

    pub(super) fn free_pixmap(&mut self, connection: &Connection, surface: SurfaceId) {
        match self.pixmaps.remove(&surface) {
            Some(pixmap) if connection.is_open() => {
                // SAFETY: pixmap was created on this display and is still live.
                unsafe { xlib::XFreePixmap(connection.display(), pixmap) };
                trace!("Pixmap {} freed", pixmap);
            }
            Some(_) => {}
            None => debug!("free_surface called for unknown surface {:?}", surface),
        }
    }

    /// Frees all pixmaps still alive and the GC. Idempotent.
    pub(super) fn cleanup(&mut self, connection: &Connection) {
        let leftover: Vec<SurfaceId> = self.pixmaps.keys().copied().collect();
        if !leftover.is_empty() {
            warn!("{} surface(s) still alive at cleanup; freeing.", leftover.len());
        }
        for surface in leftover {
            self.free_pixmap(connection, surface);
        }
        self.gc.free();
        info!("Graphics resources released.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_ops_map_to_gc_functions() {
        assert_eq!(gc_function(RasterOp::Copy), xlib::GXcopy);
        assert_eq!(gc_function(RasterOp::And), xlib::GXand);
        assert_eq!(gc_function(RasterOp::AndInverted), xlib::GXandInverted);
        assert_eq!(gc_function(RasterOp::Or), xlib::GXor);
    }

    #[test]
    fn surface_ids_carry_the_pixmap_xid() {
        let pixmap: xlib::Pixmap = 0x0040_0007;
        assert_eq!(surface_id(pixmap), SurfaceId(0x0040_0007));
    }

    #[test]
    fn freeing_a_null_gc_is_a_no_op() {
        let mut gc = SafeGc::new(ptr::null_mut(), ptr::null_mut());
        gc.free();
        gc.free();
        assert!(gc.raw().is_null());
    }
}
