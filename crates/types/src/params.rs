//! Instance parameters supplied by the host for one extension session.

use serde::{Deserialize, Serialize};

use crate::ColorEntry;

/// Account used to scope content requests when the host does not provide one.
pub const DEFAULT_ACCOUNT: &str = "dummy";

/// Read-only configuration from the host's instance parameter bag.
///
/// Field names follow the JSON keys the host sends (`contentID`, `useNames`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionParameters {
    /// Account (store) the palette content item lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Identifier of the content item holding the palette.
    #[serde(rename = "contentID")]
    pub content_id: String,
    /// Optional allow-list of group names, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Persist color names instead of raw color values.
    #[serde(rename = "useNames", default)]
    pub use_names: bool,
}

impl ExtensionParameters {
    /// The configured account, or [`DEFAULT_ACCOUNT`] when unset or empty.
    pub fn account_or_default(&self) -> &str {
        match self.account.as_deref() {
            Some(account) if !account.is_empty() => account,
            _ => DEFAULT_ACCOUNT,
        }
    }

    /// The string written to the host field for `entry`.
    pub fn key_for<'a>(&self, entry: &'a ColorEntry) -> &'a str {
        entry.key(self.use_names)
    }

    /// Group allow-list, treating an absent list as "all groups".
    pub fn group_filter(&self) -> Option<&[String]> {
        self.groups.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_deserialize_with_host_key_names() {
        let json = r#"{
            "account": "brandco",
            "contentID": "7c2e0f4a-1b2c-4d5e-8f90-a1b2c3d4e5f6",
            "groups": ["Primary", "accent"],
            "useNames": true
        }"#;
        let params: ExtensionParameters = serde_json::from_str(json).expect("deserialize params");
        assert_eq!(params.account.as_deref(), Some("brandco"));
        assert_eq!(params.content_id, "7c2e0f4a-1b2c-4d5e-8f90-a1b2c3d4e5f6");
        assert_eq!(params.groups, Some(vec!["Primary".to_string(), "accent".to_string()]));
        assert!(params.use_names);
    }

    #[test]
    fn optional_parameters_default() {
        let params: ExtensionParameters = serde_json::from_str(r#"{ "contentID": "abc" }"#).expect("deserialize params");
        assert!(params.account.is_none());
        assert!(params.groups.is_none());
        assert!(!params.use_names);
        assert_eq!(params.account_or_default(), DEFAULT_ACCOUNT);
    }

    #[test]
    fn missing_content_id_is_rejected() {
        let result = serde_json::from_str::<ExtensionParameters>(r#"{ "account": "brandco" }"#);
        let error = result.expect_err("contentID is required");
        assert!(error.to_string().contains("contentID"));
    }

    #[test]
    fn empty_account_falls_back_to_default() {
        let params = ExtensionParameters {
            account: Some(String::new()),
            content_id: "abc".into(),
            ..Default::default()
        };
        assert_eq!(params.account_or_default(), "dummy");
    }

    #[test]
    fn key_for_respects_use_names() {
        let sky = ColorEntry::new("Sky", "#00aaff");
        let mut params = ExtensionParameters::default();
        assert_eq!(params.key_for(&sky), "#00aaff");
        params.use_names = true;
        assert_eq!(params.key_for(&sky), "Sky");
    }
}
