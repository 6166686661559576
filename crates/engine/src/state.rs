//! Observable state shared with the presentation layer.

use brand_color_types::{ColorEntry, ExtensionParameters, Palette};
use serde::Serialize;

/// Everything a view needs to render the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionState {
    /// The palette, its loading placeholder, or the failure marker.
    pub palette: Palette,
    /// The active color, including placeholders for unrecognized stored values.
    pub selected: Option<ColorEntry>,
    /// Instance parameters once they have been read from the host.
    pub params: Option<ExtensionParameters>,
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self {
            palette: Palette::loading(),
            selected: None,
            params: None,
        }
    }
}

impl ExtensionState {
    /// Whether keys are color names rather than color values.
    pub fn use_names(&self) -> bool {
        self.params.as_ref().is_some_and(|params| params.use_names)
    }

    /// Whether `entry` is the active selection.
    pub fn is_selected(&self, entry: &ColorEntry) -> bool {
        self.selected.as_ref() == Some(entry)
    }

    /// The value that would be stored in the host field for the current selection.
    pub fn selected_key(&self) -> Option<&str> {
        let use_names = self.use_names();
        self.selected.as_ref().map(|entry| entry.key(use_names))
    }
}
