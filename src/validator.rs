// SPDX-License-Identifier: Apache-2.0

//! Contact submission validator.
//!
//! Implements ingress-level validation for the public contact form:
//! - Required field presence (name, email, message)
//! - URL format validation for admin-supplied image links

use crate::models::NewMessage;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid URL format for {field}: {url}")]
    InvalidUrl { field: &'static str, url: String },
}

/// Validate a contact submission.
///
/// Presence is judged on trimmed values, but the returned `NewMessage`
/// carries every field exactly as submitted.
pub fn validate_submission(
    name: Option<&str>,
    email: Option<&str>,
    subject: Option<&str>,
    message: Option<&str>,
) -> Result<NewMessage, SubmissionError> {
    let name = require_field("name", name)?;
    let email = require_field("email", email)?;
    let message = require_field("message", message)?;

    debug!(name = %name, email = %email, "Contact submission fields valid");

    Ok(NewMessage {
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.map(|s| s.to_string()),
        message: message.to_string(),
    })
}

/// Validate an image URL supplied through the admin API.
/// Only absolute http/https URLs with a host are accepted.
pub fn validate_image_url(url: &str) -> Result<(), SubmissionError> {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => {
            debug!(url = %url, "Image URL failed to parse");
            return Err(SubmissionError::InvalidUrl {
                field: "image_url",
                url: url.to_string(),
            });
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        debug!(url = %url, "Image URL has bad scheme or no host");
        return Err(SubmissionError::InvalidUrl {
            field: "image_url",
            url: url.to_string(),
        });
    }

    Ok(())
}

fn require_field<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, SubmissionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => {
            debug!(field = %field, "Missing required submission field");
            Err(SubmissionError::MissingField(field))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_submission() {
        let result = validate_submission(
            Some("Ada Lovelace"),
            Some("ada@example.edu"),
            Some("Analytical engines"),
            Some("Your course materials were a delight."),
        );

        let message = result.unwrap();
        assert_eq!(message.name, "Ada Lovelace");
        assert_eq!(message.subject.as_deref(), Some("Analytical engines"));
    }

    #[test]
    fn test_subject_is_optional() {
        let result = validate_submission(
            Some("Ada"),
            Some("ada@example.edu"),
            None,
            Some("Hello"),
        );
        assert!(result.unwrap().subject.is_none());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let result = validate_submission(None, Some("ada@example.edu"), None, Some("Hello"));
        assert_eq!(result.unwrap_err(), SubmissionError::MissingField("name"));

        let result = validate_submission(Some("Ada"), None, None, Some("Hello"));
        assert_eq!(result.unwrap_err(), SubmissionError::MissingField("email"));

        let result = validate_submission(Some("Ada"), Some("ada@example.edu"), None, None);
        assert_eq!(result.unwrap_err(), SubmissionError::MissingField("message"));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let result = validate_submission(Some("   "), Some("ada@example.edu"), None, Some("Hi"));
        assert_eq!(result.unwrap_err(), SubmissionError::MissingField("name"));
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let result = validate_submission(
            Some(" Ada "),
            Some("ada@example.edu"),
            Some(""),
            Some("  spaced out  "),
        );

        let message = result.unwrap();
        assert_eq!(message.name, " Ada ");
        assert_eq!(message.subject.as_deref(), Some(""));
        assert_eq!(message.message, "  spaced out  ");
    }

    #[test]
    fn test_image_url_validation() {
        assert!(validate_image_url("https://example.edu/lab.jpg").is_ok());
        assert!(validate_image_url("http://example.edu/lab.jpg").is_ok());

        assert!(validate_image_url("ftp://example.edu/lab.jpg").is_err());
        assert!(validate_image_url("javascript:alert(1)").is_err());
        assert!(validate_image_url("not a url").is_err());
        assert!(validate_image_url("/relative/path.jpg").is_err());
    }
}
