// src/backends/x11/mod.rs

//! Xlib implementation of `Driver`.
//!
//! Resources are split by lifetime: the `Connection` lives as long as the
//! driver, the `Window` and its `Graphics` exist once `open_window` has run.
//! `cleanup` tears them down in reverse order of creation.

pub mod connection;
mod event;
mod graphics;
mod pixel_format;
pub mod window;

use crate::backends::{
    BackendEvent, Drawable, Driver, RasterOp, Rect, SurfaceId, WindowRequest,
};
use crate::error::{Result, ViewerError};
use crate::image_loader::ImageBuffer;

use connection::Connection;
use graphics::Graphics;
use window::Window;

use log::{debug, error, info, warn};
use x11::xlib;

pub struct XDriver {
    connection: Connection,
    window: Option<Window>,
    graphics: Option<Graphics>,
}

impl XDriver {
    /// Connects to the X server named by `DISPLAY`. No window is created yet.
    pub fn connect() -> Result<Self> {
        let connection = Connection::new()?;
        Ok(XDriver {
            connection,
            window: None,
            graphics: None,
        })
    }

    fn graphics(&self) -> Result<&Graphics> {
        self.graphics
            .as_ref()
            .ok_or_else(|| ViewerError::ResourceAllocation("drawing context".to_string()))
    }
}

impl Driver for XDriver {
    fn open_window(&mut self, request: &WindowRequest) -> Result<(u32, u32)> {
        if self.window.is_some() {
            warn!("open_window called twice; keeping the existing window.");
        }
        // The window starts out as large as the screen.
        let (width, height) = self.connection.screen_size();
        let window = Window::new(&self.connection, width, height, request.background)?;
        // Stored before anything else can fail so `cleanup` destroys it.
        let window = self.window.insert(window);
        window.setup_protocols_and_hints(&self.connection, request)?;
        self.graphics = Some(Graphics::new(&self.connection, window.id())?);
        window.map_and_flush(&self.connection);
        Ok((width, height))
    }

    fn next_event(&mut self) -> Result<BackendEvent> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| ViewerError::ResourceAllocation("window".to_string()))?;
        Ok(event::next_event(&self.connection, window))
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId> {
        let XDriver {
            connection,
            graphics,
            ..
        } = self;
        graphics
            .as_mut()
            .ok_or_else(|| ViewerError::ResourceAllocation("drawing context".to_string()))?
            .create_pixmap(connection, width, height)
    }

    fn put_image(&mut self, surface: SurfaceId, image: &ImageBuffer) -> Result<()> {
        let XDriver {
            connection,
            graphics,
            ..
        } = self;
        graphics
            .as_mut()
            .ok_or_else(|| ViewerError::ResourceAllocation("drawing context".to_string()))?
            .put_image(connection, surface, image)
    }

    fn raster_op(&self) -> RasterOp {
        self.graphics
            .as_ref()
            .map_or(RasterOp::default(), Graphics::raster_op)
    }

    fn set_raster_op(&mut self, op: RasterOp) {
        let XDriver {
            connection,
            graphics,
            ..
        } = self;
        match graphics.as_mut() {
            Some(graphics) => graphics.set_raster_op(connection, op),
            None => warn!("set_raster_op({:?}) before the window was opened.", op),
        }
    }

    fn copy_area(
        &mut self,
        src: Drawable,
        dst: Drawable,
        area: Rect,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        self.graphics()?
            .copy_area(&self.connection, src, dst, area, dst_x, dst_y)
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        let XDriver {
            connection,
            graphics,
            ..
        } = self;
        if let Some(graphics) = graphics.as_mut() {
            graphics.free_pixmap(connection, surface);
        }
    }

    fn flush(&mut self) {
        if self.connection.is_open() {
            // SAFETY: display is open.
            unsafe { xlib::XFlush(self.connection.display()) };
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        if let Some(mut graphics) = self.graphics.take() {
            graphics.cleanup(&self.connection);
        }
        if let Some(mut window) = self.window.take() {
            window.cleanup(&self.connection);
        }
        self.connection.cleanup();
        debug!("XDriver cleanup complete.");
        Ok(())
    }
}

impl Drop for XDriver {
    fn drop(&mut self) {
        info!("Dropping XDriver instance, performing cleanup.");
        if let Err(e) = self.cleanup() {
            error!("Error during XDriver cleanup in drop: {}", e);
        }
    }
}
