//! Semantic configuration checks, run after deserialization.

use crate::config::schema::HostConfig;
use crate::content::ContentTypeRegistry;

/// A single semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("enabled_formats must not be empty")]
    NoFormatsEnabled,

    #[error("default_content_type {0:?} is not a recognized content type")]
    UnknownDefaultContentType(String),

    #[error("default_content_type {0:?} maps to a format that is not enabled")]
    DefaultFormatDisabled(String),
}

/// Validate a config, collecting every problem rather than stopping at the
/// first.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let content_types = ContentTypeRegistry::default();

    if config.enabled_formats.is_empty() {
        errors.push(ValidationError::NoFormatsEnabled);
    }

    match content_types.lookup(&config.default_content_type) {
        None => errors.push(ValidationError::UnknownDefaultContentType(
            config.default_content_type.clone(),
        )),
        Some(format) => {
            if !config.enabled_formats.is_empty() && !config.enabled_formats.contains(&format) {
                errors.push(ValidationError::DefaultFormatDisabled(
                    config.default_content_type.clone(),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
