// src/backends/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::pixel_format::PixelFormat;
use crate::error::{Result, ViewerError};

use log::{debug, info};
use std::ptr;

// X11 library imports
use libc::c_int;
use x11::xlib;

/// Owns the raw `*mut xlib::Display` and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens the display named by `DISPLAY`.
    fn new() -> Result<Self> {
        // A null name makes Xlib read the DISPLAY environment variable itself.
        let display_ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display_ptr.is_null() {
            return Err(ViewerError::DisplayConnect {
                display: std::env::var("DISPLAY").unwrap_or_default(),
            });
        }
        debug!("X display opened: {:p}", display_ptr);
        Ok(Self { ptr: display_ptr })
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            info!("Closing X11 display connection: {:p}", self.ptr);
            // SAFETY: ptr came from XOpenDisplay and has not been closed yet.
            unsafe {
                xlib::XCloseDisplay(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// Connection to the X server plus the default screen's visual, colormap
/// and depth.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    colormap: xlib::Colormap,
    visual: *mut xlib::Visual,
    depth: c_int,
    pixel_format: PixelFormat,
}

impl Connection {
    /// Connects to the X server named by `DISPLAY` and inspects its default
    /// screen.
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)`: An open connection whose default visual is
    ///   TrueColor with usable channel masks.
    /// * `Err(ViewerError::DisplayConnect)`: If the server cannot be reached.
    /// * `Err(ViewerError::UnsupportedVisual)`: If the default visual is not
    ///   TrueColor or its masks cannot be packed into. The display is closed
    ///   before returning.
    pub fn new() -> Result<Self> {
        info!("Establishing X11 server connection.");
        let managed_display = ManagedDisplay::new()?;
        let display = managed_display.raw();

        // SAFETY: display is a valid, open connection.
        let (screen, colormap, visual, depth) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (
                screen,
                xlib::XDefaultColormap(display, screen),
                xlib::XDefaultVisual(display, screen),
                xlib::XDefaultDepth(display, screen),
            )
        };
        if visual.is_null() {
            return Err(ViewerError::ResourceAllocation(format!(
                "XDefaultVisual for screen {}",
                screen
            )));
        }

        // SAFETY: visual was checked for null above.
        let (class, red, green, blue) = unsafe {
            (
                (*visual).class,
                u64::from((*visual).red_mask),
                u64::from((*visual).green_mask),
                u64::from((*visual).blue_mask),
            )
        };
        let pixel_format = if class == xlib::TrueColor {
            PixelFormat::from_masks(red, green, blue)
        } else {
            None
        };
        let pixel_format = pixel_format.ok_or_else(|| {
            ViewerError::UnsupportedVisual(format!(
                "class {}, depth {}, masks {:#x}/{:#x}/{:#x}; TrueColor required",
                class, depth, red, green, blue
            ))
        })?;
        if pixel_format != PixelFormat::XRGB8888 {
            debug!(
                "Visual masks {:#x}/{:#x}/{:#x}; pixels will be repacked.",
                red, green, blue
            );
        }

        debug!(
            "Screen {}: depth {}, colormap {}, visual {:p}",
            screen, depth, colormap, visual
        );
        info!("X11 server connection established successfully.");
        Ok(Connection {
            managed_display,
            screen,
            colormap,
            visual,
            depth,
            pixel_format,
        })
    }

    /// Marks the connection closed and disconnects. Idempotent.
    pub fn cleanup(&mut self) {
        if self.managed_display.ptr.is_null() {
            debug!("X11 display connection already closed; cleanup skipped.");
            return;
        }
        // SAFETY: pointer is non-null and owned by us.
        unsafe {
            xlib::XCloseDisplay(self.managed_display.ptr);
        }
        info!("X11 display connection closed.");
        self.managed_display.ptr = ptr::null_mut();
    }

    /// Raw display pointer for Xlib calls. Null once `cleanup` has run.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.raw()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.managed_display.ptr.is_null()
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn colormap(&self) -> xlib::Colormap {
        self.colormap
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    #[inline]
    pub fn depth(&self) -> c_int {
        self.depth
    }

    /// Layout of a pixel on the default visual.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Size in pixels of the default screen.
    pub fn screen_size(&self) -> (u32, u32) {
        if !self.is_open() {
            return (0, 0);
        }
        // SAFETY: display is open.
        unsafe {
            let width = xlib::XDisplayWidth(self.display(), self.screen);
            let height = xlib::XDisplayHeight(self.display(), self.screen);
            (width.max(1) as u32, height.max(1) as u32)
        }
    }
}
