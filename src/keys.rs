// src/keys.rs

use serde::{Deserialize, Serialize};

/// A key as seen by the viewer.
///
/// Keys are looked up without shift applied (keysym index 0), so pressing
/// `Q` with shift held still reports `Char('q')`. Only printable keys can be
/// bound; everything else is reported coarsely for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    Char(char),

    /// Shift, Control, Alt or Super pressed on its own.
    Modifier,

    #[default]
    Unknown,
}

impl KeySymbol {
    /// Returns true if the key symbol represents a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, KeySymbol::Modifier)
    }
}
