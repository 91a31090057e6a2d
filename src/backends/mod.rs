// src/backends/mod.rs

//! Defines the `Driver` trait the viewer talks to the windowing system
//! through, and the small vocabulary shared by its implementations:
//! notifications (`BackendEvent`), drawables and raster ops.

pub use crate::keys::KeySymbol;
use crate::error::Result;
use crate::image_loader::ImageBuffer;

#[cfg(test)]
pub mod mock;
pub mod x11;

/// Notifications delivered by the windowing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Part of the window needs repainting. `count` is the number of expose
    /// events still queued behind this one.
    Expose { count: u32 },
    /// The window was resized (ConfigureNotify).
    Resize { width: u32, height: u32 },
    /// A key was pressed.
    Key { symbol: KeySymbol },
    /// A mouse button was pressed.
    ButtonPress { button: u32 },
    /// The window manager asked the window to close (WM_DELETE_WINDOW).
    CloseRequested,
    /// Anything else the server sent; carries the raw event type.
    Other(i32),
}

/// Handle of an off-screen surface owned by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Something a driver can copy pixels from or into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawable {
    Window,
    Surface(SurfaceId),
}

/// Bitwise combine function applied by `copy_area`, named after the X11
/// GC functions they map to. `src` is the pixel copied, `dst` the pixel
/// already in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterOp {
    /// `src` (GXcopy).
    #[default]
    Copy,
    /// `src AND dst` (GXand).
    And,
    /// `(NOT src) AND dst` (GXandInverted).
    AndInverted,
    /// `src OR dst` (GXor).
    Or,
}

/// Axis-aligned rectangle in drawable coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Rect::new(0, 0, width, height)
    }
}

/// What the viewer asks for when it opens its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub title: String,
    pub background: crate::color::Color,
    pub min_width: u32,
    pub min_height: u32,
    pub base_width: u32,
    pub base_height: u32,
}

/// Interface to the windowing system.
///
/// Drivers own every server-side resource they hand out. Surfaces must be
/// released with `free_surface`; whatever is left when `cleanup` runs (or
/// the driver is dropped) is released then.
pub trait Driver {
    /// Creates, titles, hints and maps the window.
    ///
    /// # Arguments
    ///
    /// * `request`: Title, background color and size hints for the window.
    ///
    /// # Returns
    ///
    /// * `Ok((width, height))`: The window's initial size in pixels.
    /// * `Err(ViewerError)`: If the window or its drawing context cannot be
    ///   created. Anything already created is released by `cleanup`.
    fn open_window(&mut self, request: &WindowRequest) -> Result<(u32, u32)>;

    /// Blocks until the next notification arrives.
    ///
    /// # Returns
    ///
    /// * `Ok(BackendEvent)`: The next event, already translated.
    /// * `Err(ViewerError)`: If no window is open.
    fn next_event(&mut self) -> Result<BackendEvent>;

    /// Allocates an off-screen surface with the window's depth.
    ///
    /// # Arguments
    ///
    /// * `width`, `height`: Surface size in pixels. Zero is raised to one.
    ///
    /// # Returns
    ///
    /// * `Ok(SurfaceId)`: Handle to pass to `put_image`, `copy_area` and
    ///   `free_surface`.
    /// * `Err(ViewerError::ResourceAllocation)`: If the surface cannot be
    ///   allocated.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId>;

    /// Writes the image into `surface` at its origin. Alpha is dropped.
    ///
    /// # Arguments
    ///
    /// * `surface`: A surface from `create_surface`, at least as large as
    ///   `image`.
    /// * `image`: Pixels to upload.
    ///
    /// # Returns
    ///
    /// * `Err(ViewerError)`: If `surface` is unknown, the upload buffer cannot
    ///   be allocated, or the display's pixel layout is unsupported.
    fn put_image(&mut self, surface: SurfaceId, image: &ImageBuffer) -> Result<()>;

    /// Combine function currently set on the drawing context.
    fn raster_op(&self) -> RasterOp;

    /// Sets the combine function used by subsequent `copy_area` calls.
    fn set_raster_op(&mut self, op: RasterOp);

    /// Combines `area` of `src` into `dst` using the current raster op.
    /// Pixels that fall outside either drawable are clipped.
    ///
    /// # Arguments
    ///
    /// * `src`: Drawable to read from.
    /// * `dst`: Drawable to combine into.
    /// * `area`: Source rectangle, in `src` coordinates.
    /// * `dst_x`, `dst_y`: Where the top-left of `area` lands in `dst`. May be
    ///   negative.
    ///
    /// # Returns
    ///
    /// * `Err(ViewerError)`: If either drawable is unknown.
    fn copy_area(
        &mut self,
        src: Drawable,
        dst: Drawable,
        area: Rect,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()>;

    /// Releases an off-screen surface. Unknown ids are ignored.
    fn free_surface(&mut self, surface: SurfaceId);

    /// Pushes queued requests to the server.
    fn flush(&mut self);

    /// Releases the drawing context, destroys the window and disconnects.
    ///
    /// Idempotent: later calls do nothing and return `Ok(())`.
    fn cleanup(&mut self) -> Result<()>;
}
