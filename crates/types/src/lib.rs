//! Shared type definitions for the brand color field extension.
//!
//! The palette shapes in this crate are deserialized directly from the body of
//! a content item, so their serde attributes mirror the wire format exactly.

pub mod palette;
pub mod params;

use serde::{Deserialize, Serialize};

pub use palette::{ColorGroup, FAILED_PALETTE_PREFIX, LOADING_PALETTE_NAME, Palette};
pub use params::{DEFAULT_ACCOUNT, ExtensionParameters};

/// A single selectable color: a display name paired with its color value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorEntry {
    /// Human-readable name shown next to the swatch (e.g., "Sky").
    pub name: String,
    /// Raw color value (e.g., "#00aaff").
    pub color: String,
}

impl ColorEntry {
    /// Create a new entry from a name and a color value.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Build the placeholder entry used for a stored value that matches nothing
    /// in the palette. Both the name and the color carry the raw value so the
    /// UI can still display it.
    pub fn unrecognized(raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        Self {
            name: raw_value.clone(),
            color: raw_value,
        }
    }

    /// Returns the string persisted to the host field for this entry.
    pub fn key(&self, use_names: bool) -> &str {
        if use_names { &self.name } else { &self.color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_entry_repeats_raw_value() {
        let entry = ColorEntry::unrecognized("#123456");
        assert_eq!(entry.name, "#123456");
        assert_eq!(entry.color, "#123456");
    }

    #[test]
    fn key_follows_use_names_flag() {
        let sky = ColorEntry::new("Sky", "#00aaff");
        assert_eq!(sky.key(true), "Sky");
        assert_eq!(sky.key(false), "#00aaff");
    }

    #[test]
    fn color_entry_deserializes_from_wire_shape() {
        let json = r##"{ "name": "Sky", "color": "#00aaff" }"##;
        let entry: ColorEntry = serde_json::from_str(json).expect("deserialize ColorEntry");
        assert_eq!(entry, ColorEntry::new("Sky", "#00aaff"));
    }
}
