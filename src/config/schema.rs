//! Configuration schema definitions.
//!
//! Every option here gates exactly one decision point in the dispatch
//! pipeline; none of them is consulted anywhere else.

use serde::{Deserialize, Serialize};

use crate::content::Format;
use crate::registry::MetadataVisibility;

/// Host-wide feature flags and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Strip a recognized format suffix (`.json`, `.xml`, ...) from the
    /// path before route matching; the suffix wins content negotiation.
    pub allow_route_content_type_extensions: bool,

    /// Honor the `callback=` query parameter by wrapping JSON responses
    /// in `name(...)` padding.
    pub allow_jsonp_requests: bool,

    /// Wire formats the host answers. Disabled formats are rejected
    /// before any deserialization work.
    pub enabled_formats: Vec<Format>,

    /// Content type used when negotiation produces no other answer.
    pub default_content_type: String,

    /// Write an error body on failure; when off, clients get only a
    /// status code.
    pub write_errors_to_response: bool,

    /// Include the cause chain in error bodies (debug verbosity switch).
    pub return_error_detail: bool,

    /// Scopes the operation listing a metadata page may expose.
    pub metadata_visibility: MetadataVisibility,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            allow_route_content_type_extensions: true,
            allow_jsonp_requests: true,
            enabled_formats: vec![
                Format::Json,
                Format::Xml,
                Format::Jsv,
                Format::Csv,
                Format::Soap11,
                Format::Soap12,
            ],
            default_content_type: "application/json".to_string(),
            write_errors_to_response: true,
            return_error_detail: false,
            metadata_visibility: MetadataVisibility::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_format() {
        let config = HostConfig::default();
        assert_eq!(config.enabled_formats.len(), 6);
        assert_eq!(config.default_content_type, "application/json");
        assert!(config.write_errors_to_response);
        assert!(!config.return_error_detail);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert!(config.allow_jsonp_requests);
    }

    #[test]
    fn formats_deserialize_from_names() {
        let config: HostConfig =
            toml::from_str(r#"enabled_formats = ["json", "soap12"]"#).unwrap();
        assert_eq!(config.enabled_formats, vec![Format::Json, Format::Soap12]);
    }
}
