//! Palette content model and the derived flat color list.

use serde::{Deserialize, Serialize};

use crate::{ColorEntry, ExtensionParameters};

/// Name shown while the palette is still being fetched.
pub const LOADING_PALETTE_NAME: &str = "Loading...";

/// Prefix of the palette name shown after a failed load.
pub const FAILED_PALETTE_PREFIX: &str = "Failed to load colors: ";

/// A named bucket of colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    pub name: String,
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
}

/// The palette content item plus the flat list of currently selectable colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Display name. Annotated with the selected group names after preparation.
    pub name: String,
    /// Groups in the order they are stored in the content item.
    #[serde(default)]
    pub groups: Vec<ColorGroup>,
    /// Flattened, filtered list derived from `groups`.
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
    /// Set when the palette stands in for a failed load.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failure: bool,
}

impl Palette {
    /// Placeholder published before the content item arrives.
    pub fn loading() -> Self {
        Self {
            name: LOADING_PALETTE_NAME.to_string(),
            ..Default::default()
        }
    }

    /// Terminal palette shown when initialization fails.
    pub fn failed(message: impl AsRef<str>) -> Self {
        Self {
            name: format!("({}{})", FAILED_PALETTE_PREFIX, message.as_ref()),
            groups: Vec::new(),
            colors: Vec::new(),
            failure: true,
        }
    }

    /// Concatenate the colors of the selected groups.
    ///
    /// With no filter every group contributes in stored order. With a filter,
    /// groups are taken in the filter's order and matched case-insensitively;
    /// names that match no group are dropped.
    pub fn combine_groups(&self, filter: Option<&[String]>) -> Vec<ColorEntry> {
        match filter {
            None => self.groups.iter().flat_map(|group| group.colors.iter().cloned()).collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| self.find_group(name))
                .flat_map(|group| group.colors.iter().cloned())
                .collect(),
        }
    }

    /// Derive the flat color list from `params` and annotate the name with the
    /// selected group names when an allow-list is configured.
    pub fn prepare(&mut self, params: &ExtensionParameters) {
        self.colors = self.combine_groups(params.group_filter());

        if let Some(groups) = params.groups.as_ref()
            && !groups.is_empty()
        {
            self.name.push_str(&format!(" ({})", groups.join(", ")));
        }
    }

    /// Reconcile a stored key against the flat list.
    ///
    /// Returns `None` for no key, the matching entry (compared
    /// case-insensitively on its persisted key) when one exists, and otherwise
    /// a synthetic entry carrying the raw key.
    pub fn find_existing_color(&self, key: Option<&str>, use_names: bool) -> Option<ColorEntry> {
        let key = key?;
        let wanted = key.to_lowercase();
        let found = self
            .colors
            .iter()
            .find(|entry| entry.key(use_names).to_lowercase() == wanted)
            .cloned();
        Some(found.unwrap_or_else(|| ColorEntry::unrecognized(key)))
    }

    fn find_group(&self, name: &str) -> Option<&ColorGroup> {
        let wanted = name.to_lowercase();
        self.groups.iter().find(|group| group.name.to_lowercase() == wanted)
    }
}
