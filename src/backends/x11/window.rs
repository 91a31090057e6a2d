// src/backends/x11/window.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use crate::backends::WindowRequest;
use crate::color::Color;
use crate::error::{Result, ViewerError};

use log::{debug, error, info, trace, warn};
use std::ffi::CString;
use std::mem;

// X11 library imports
use libc::{c_char, c_int, c_long, c_uint};
use x11::xlib;

/// Events the viewer listens for.
const EVENT_MASK: c_long =
    xlib::ExposureMask | xlib::KeyPressMask | xlib::ButtonPressMask | xlib::StructureNotifyMask;

/// The viewer's top-level X11 window.
///
/// `cleanup` must be called before the `Connection` closes; `Drop` only logs
/// if it was skipped because it has no display pointer to work with.
#[derive(Debug)]
pub struct Window {
    id: xlib::Window,
    wm_delete_window: xlib::Atom,
    protocols_atom: xlib::Atom,
}

impl Window {
    /// Creates a new, unmapped X11 window.
    ///
    /// The window uses the connection's default visual and colormap and
    /// selects the events in `EVENT_MASK`. Protocols and hints are set later
    /// by `setup_protocols_and_hints`.
    ///
    /// # Arguments
    ///
    /// * `connection`: A reference to the active X11 `Connection`.
    /// * `width`, `height`: Initial size in pixels.
    /// * `background`: Color the server fills exposed areas with.
    ///
    /// # Returns
    ///
    /// * `Ok(Window)`: The created window, owned by the caller until `cleanup`.
    /// * `Err(ViewerError::ResourceAllocation)`: If `XCreateWindow` fails.
    pub fn new(connection: &Connection, width: u32, height: u32, background: Color) -> Result<Self> {
        info!("Creating X11 window: {}x{}px", width, height);
        let display = connection.display();
        let screen = connection.screen();
        let background_pixel = alloc_pixel(connection, background);

        // SAFETY: connection is open; attributes is fully initialized.
        let window_id = unsafe {
            let root_window = xlib::XRootWindow(display, screen);
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.colormap = connection.colormap();
            attributes.background_pixel = background_pixel;
            attributes.border_pixel = xlib::XWhitePixel(display, screen);
            attributes.event_mask = EVENT_MASK;

            xlib::XCreateWindow(
                display,
                root_window,
                0,
                0,
                width as c_uint,
                height as c_uint,
                0,
                connection.depth(),
                xlib::InputOutput as c_uint,
                connection.visual(),
                xlib::CWColormap | xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWEventMask,
                &mut attributes,
            )
        };
        if window_id == 0 {
            return Err(ViewerError::ResourceAllocation("XCreateWindow".to_string()));
        }
        debug!("X window created (ID: {})", window_id);

        Ok(Self {
            id: window_id,
            wm_delete_window: 0,
            protocols_atom: 0,
        })
    }

    /// Sets the title, WM_NORMAL_HINTS, WM_HINTS and the WM_DELETE_WINDOW
    /// protocol.
    ///
    /// # Arguments
    ///
    /// * `connection`: The `Connection` the window was created on.
    /// * `request`: Title and size hints to advertise.
    ///
    /// # Returns
    ///
    /// * `Err(ViewerError::ResourceAllocation)`: If `XAllocSizeHints` or
    ///   `XAllocWMHints` return null.
    pub fn setup_protocols_and_hints(
        &mut self,
        connection: &Connection,
        request: &WindowRequest,
    ) -> Result<()> {
        let display = connection.display();
        self.set_title(connection, &request.title)?;

        // SAFETY: Xlib calls on a valid display and window; hint structs are
        // allocated by Xlib and freed right after use.
        unsafe {
            self.wm_delete_window = xlib::XInternAtom(
                display,
                b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,
                xlib::False,
            );
            self.protocols_atom = xlib::XInternAtom(
                display,
                b"WM_PROTOCOLS\0".as_ptr() as *const c_char,
                xlib::False,
            );
            if self.wm_delete_window != 0 && self.protocols_atom != 0 {
                xlib::XSetWMProtocols(display, self.id, [self.wm_delete_window].as_mut_ptr(), 1);
                debug!("WM_PROTOCOLS (WM_DELETE_WINDOW) registered.");
            } else {
                warn!("WM_DELETE_WINDOW atom unavailable; closing via the window manager will not be seen.");
            }

            let size_hints = xlib::XAllocSizeHints();
            if size_hints.is_null() {
                return Err(ViewerError::ResourceAllocation("XAllocSizeHints".to_string()));
            }
            (*size_hints).flags = xlib::PSize | xlib::PMinSize | xlib::PBaseSize;
            (*size_hints).min_width = request.min_width as c_int;
            (*size_hints).min_height = request.min_height as c_int;
            (*size_hints).base_width = request.base_width as c_int;
            (*size_hints).base_height = request.base_height as c_int;
            (*size_hints).width = request.base_width as c_int;
            (*size_hints).height = request.base_height as c_int;
            xlib::XSetWMNormalHints(display, self.id, size_hints);
            xlib::XFree(size_hints as *mut _);
            debug!(
                "WM size hints set (min: {}x{}, base: {}x{}).",
                request.min_width, request.min_height, request.base_width, request.base_height
            );

            let wm_hints = xlib::XAllocWMHints();
            if wm_hints.is_null() {
                return Err(ViewerError::ResourceAllocation("XAllocWMHints".to_string()));
            }
            (*wm_hints).flags = xlib::InputHint;
            (*wm_hints).input = xlib::True;
            xlib::XSetWMHints(display, self.id, wm_hints);
            xlib::XFree(wm_hints as *mut _);
        }
        Ok(())
    }

    /// Sets `title` via `XStoreName` and `_NET_WM_NAME` (UTF-8).
    pub fn set_title(&self, connection: &Connection, title: &str) -> Result<()> {
        trace!("Setting window title to '{}'", title);
        let display = connection.display();
        // Interior NULs cannot cross into Xlib; drop them rather than fail.
        let title_cstr = CString::new(title.replace('\0', ""))
            .map_err(|_| ViewerError::ResourceAllocation("window title".to_string()))?;

        // SAFETY: valid display and window; title_cstr outlives the calls.
        unsafe {
            xlib::XStoreName(display, self.id, title_cstr.as_ptr() as *mut c_char);

            let net_wm_name_atom = xlib::XInternAtom(
                display,
                b"_NET_WM_NAME\0".as_ptr() as *const c_char,
                xlib::False,
            );
            let utf8_string_atom = xlib::XInternAtom(
                display,
                b"UTF8_STRING\0".as_ptr() as *const c_char,
                xlib::False,
            );
            if net_wm_name_atom != 0 && utf8_string_atom != 0 {
                xlib::XChangeProperty(
                    display,
                    self.id,
                    net_wm_name_atom,
                    utf8_string_atom,
                    8,
                    xlib::PropModeReplace,
                    title_cstr.as_ptr() as *const u8,
                    title_cstr.as_bytes().len() as c_int,
                );
            }
        }
        debug!("Window title set to: {}", title);
        Ok(())
    }

    /// Maps the window and flushes so the map request reaches the server.
    pub fn map_and_flush(&self, connection: &Connection) {
        info!("Mapping window ID: {}", self.id);
        // SAFETY: valid display and window.
        unsafe {
            xlib::XMapWindow(connection.display(), self.id);
            xlib::XFlush(connection.display());
        }
    }

    /// Destroys the window. Idempotent.
    pub fn cleanup(&mut self, connection: &Connection) {
        if self.id != 0 && connection.is_open() {
            info!("Destroying X11 window (ID: {}).", self.id);
            // SAFETY: valid display and window.
            unsafe {
                xlib::XDestroyWindow(connection.display(), self.id);
                xlib::XFlush(connection.display());
            }
        }
        self.id = 0;
    }

    #[inline]
    pub fn id(&self) -> xlib::Window {
        self.id
    }

    #[inline]
    pub fn wm_delete_window_atom(&self) -> xlib::Atom {
        self.wm_delete_window
    }

    #[inline]
    pub fn protocols_atom(&self) -> xlib::Atom {
        self.protocols_atom
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.id != 0 {
            error!(
                "Window (ID: {}) dropped without explicit cleanup. Server resources may leak.",
                self.id
            );
        }
    }
}

/// Allocates `color` in the default colormap, falling back to the color
/// packed for the visual if the server refuses.
fn alloc_pixel(connection: &Connection, color: Color) -> libc::c_ulong {
    let (red, green, blue) = color.to_x_channels();
    // SAFETY: XColor is plain data; display and colormap are valid.
    unsafe {
        let mut xcolor: xlib::XColor = mem::zeroed();
        xcolor.red = red;
        xcolor.green = green;
        xcolor.blue = blue;
        xcolor.flags = (xlib::DoRed | xlib::DoGreen | xlib::DoBlue) as c_char;
        if xlib::XAllocColor(connection.display(), connection.colormap(), &mut xcolor) != 0 {
            trace!("Allocated {:?} as pixel {:#x}", color, xcolor.pixel);
            xcolor.pixel
        } else {
            warn!("XAllocColor failed for {:?}; using packed TrueColor value.", color);
            connection.pixel_format().encode(color) as libc::c_ulong
        }
    }
}
