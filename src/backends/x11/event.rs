// src/backends/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use super::window::Window;
use crate::backends::{BackendEvent, KeySymbol};

use log::{debug, trace};
use std::mem;

// X11 library imports
use x11::keysym;
use x11::xlib;

/// Offset X11 adds to a Unicode code point to form its keysym.
const UNICODE_KEYSYM_BASE: xlib::KeySym = 0x0100_0000;

/// Blocks in `XNextEvent` and translates what arrives.
pub(super) fn next_event(connection: &Connection, window: &Window) -> BackendEvent {
    // SAFETY: display is open; XNextEvent fills the whole union.
    let mut event: xlib::XEvent = unsafe { mem::zeroed() };
    unsafe { xlib::XNextEvent(connection.display(), &mut event) };
    translate(&mut event, window)
}

fn translate(event: &mut xlib::XEvent, window: &Window) -> BackendEvent {
    let event_type = event.get_type();
    // SAFETY: each arm reads the union member matching `event_type`.
    match event_type {
        xlib::Expose => {
            let xexpose = unsafe { event.expose };
            trace!(
                "Expose: {}x{} at ({}, {}), {} more",
                xexpose.width,
                xexpose.height,
                xexpose.x,
                xexpose.y,
                xexpose.count
            );
            BackendEvent::Expose {
                count: xexpose.count.max(0) as u32,
            }
        }
        xlib::ConfigureNotify => {
            let xconfigure = unsafe { event.configure };
            trace!("ConfigureNotify: {}x{}", xconfigure.width, xconfigure.height);
            BackendEvent::Resize {
                width: xconfigure.width.max(0) as u32,
                height: xconfigure.height.max(0) as u32,
            }
        }
        xlib::KeyPress => {
            // Index 0 ignores shift: `Q` reports as `q`.
            let keysym = unsafe { xlib::XLookupKeysym(&mut event.key, 0) };
            let symbol = xkeysym_to_keysymbol(keysym);
            trace!("KeyPress: keysym {:#x} -> {:?}", keysym, symbol);
            BackendEvent::Key { symbol }
        }
        xlib::ButtonPress => {
            let xbutton = unsafe { event.button };
            BackendEvent::ButtonPress {
                button: xbutton.button,
            }
        }
        xlib::ClientMessage => {
            let xclient = unsafe { event.client_message };
            let protocol = xclient.data.get_long(0) as xlib::Atom;
            if xclient.message_type == window.protocols_atom()
                && protocol == window.wm_delete_window_atom()
            {
                debug!("WM_DELETE_WINDOW received.");
                BackendEvent::CloseRequested
            } else {
                trace!("Ignoring ClientMessage of type {}", xclient.message_type);
                BackendEvent::Other(event_type)
            }
        }
        other => BackendEvent::Other(other),
    }
}

fn xkeysym_to_keysymbol(keysym_val: xlib::KeySym) -> KeySymbol {
    // Unicode keysyms carry the code point in the low bits.
    if (UNICODE_KEYSYM_BASE..=UNICODE_KEYSYM_BASE + 0x10_FFFF).contains(&keysym_val) {
        return char::from_u32((keysym_val - UNICODE_KEYSYM_BASE) as u32)
            .map_or(KeySymbol::Unknown, KeySymbol::Char);
    }
    if keysym_val > xlib::KeySym::from(u32::MAX) {
        return KeySymbol::Unknown;
    }

    match keysym_val as u32 {
        keysym::XK_Shift_L
        | keysym::XK_Shift_R
        | keysym::XK_Control_L
        | keysym::XK_Control_R
        | keysym::XK_Alt_L
        | keysym::XK_Alt_R
        | keysym::XK_Meta_L
        | keysym::XK_Meta_R
        | keysym::XK_Super_L
        | keysym::XK_Super_R
        | keysym::XK_Hyper_L
        | keysym::XK_Hyper_R => KeySymbol::Modifier,
        // Latin-1 keysyms equal their code points.
        printable @ (0x20..=0x7E | 0xA0..=0xFF) => {
            char::from_u32(printable).map_or(KeySymbol::Unknown, KeySymbol::Char)
        }
        other => {
            trace!("Unhandled keysym {:#x}, mapping to Unknown", other);
            KeySymbol::Unknown
        }
    }
}
