// src/cli.rs

//! Command line handling: exactly one file argument, which must be openable.

use crate::error::{Result, ViewerError};

use clap::Parser;
use log::debug;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Minimal X11 image viewer
#[derive(Parser, Debug)]
#[command(name = "sip", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Image file to display
    file: PathBuf,
}

/// Parses the full argument list, program name included.
///
/// Exactly one argument must follow the program name and it must not be
/// `-h`; anything else is a `Usage` error. The argument is taken verbatim,
/// so `-photo.png`, `--help` or `--` name files like any other word. Clap's
/// own help and error output is never printed.
pub fn parse_args<I, T>(args: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let raw: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let (program, file) = match raw.as_slice() {
        [program, file] if file.as_os_str() != "-h" => (program, file),
        _ => {
            debug!("Expected one file argument, got {:?}", raw.get(1..));
            return Err(ViewerError::Usage);
        }
    };

    // Behind `--` clap hands the word to `file` without flag parsing.
    let escaped = [program.clone(), OsString::from("--"), file.clone()];
    let args = Args::try_parse_from(escaped).map_err(|e| {
        debug!("Argument parsing failed: {}", e.kind());
        ViewerError::Usage
    })?;
    Ok(args.file)
}

/// Checks that `path` can be opened for reading. Says nothing about whether
/// it holds an image.
pub fn check_openable(path: &Path) -> Result<()> {
    File::open(path)
        .map(drop)
        .map_err(|source| ViewerError::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}
