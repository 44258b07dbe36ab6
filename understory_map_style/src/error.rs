// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while compiling a style document.

use core::fmt;

/// Error returned when a style document cannot be compiled.
///
/// Only construction fails; resolving a feature against a compiled evaluator
/// never returns an error.
#[derive(Debug)]
pub enum StyleError {
    /// The document's `version` is not the supported schema version.
    UnsupportedVersion {
        /// The version found in the document.
        found: u64,
    },
    /// The input text is not valid JSON or does not match the document shape.
    Json(serde_json::Error),
    /// The document is structurally wrong in a way the JSON layer accepts.
    InvalidDocument(&'static str),
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found } => write!(
                f,
                "style version {} required, found version {found}",
                crate::document::SUPPORTED_VERSION
            ),
            Self::Json(err) => write!(f, "malformed style document: {err}"),
            Self::InvalidDocument(reason) => write!(f, "invalid style document: {reason}"),
        }
    }
}

impl core::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StyleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn version_message_names_both_versions() {
        let message = StyleError::UnsupportedVersion { found: 7 }.to_string();
        assert!(message.contains('8'), "{message}");
        assert!(message.contains('7'), "{message}");
    }

    #[test]
    fn json_errors_expose_their_source() {
        let err: StyleError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(core::error::Error::source(&err).is_some());
    }
}
