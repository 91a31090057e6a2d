// src/error.rs

//! Error kinds the viewer can hit. None of them are retried: each one is
//! reported on stderr and ends the process with a non-zero status.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// Bad, missing or extra command-line argument (including `-h`).
    #[error("Usage: sip [FILE]")]
    Usage,

    /// The path given on the command line cannot be opened for reading.
    #[error("Cannot open {}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The X server named by `DISPLAY` could not be reached.
    #[error("cannot connect to X server '{display}'")]
    DisplayConnect { display: String },

    /// The file opens but is not an image the decoder understands.
    #[error("cannot decode {} as an image", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The windowing layer could not allocate something (hints, GC, pixmap, XImage).
    #[error("{0} - out of memory")]
    ResourceAllocation(String),

    /// The display's pixel layout is not one the viewer can draw into.
    #[error("unsupported visual: {0}")]
    UnsupportedVisual(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
