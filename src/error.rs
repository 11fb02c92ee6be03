//! Error handling for the navigation controller
//!
//! Only caller mistakes surface as errors. Host desynchronization and lost
//! acknowledgments are recovered internally and logged instead.

use std::fmt;

/// Errors returned synchronously to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavKeysError {
    /// The address could not be parsed or resolved against the current one
    InvalidUrl {
        /// Address as given by the caller
        input: String,
        /// Underlying parse failure
        source: url::ParseError,
    },

    /// The controller was shut down with `exit()`
    Exited,
}

impl NavKeysError {
    /// Create an invalid address error
    pub fn invalid_url(input: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            source,
        }
    }

    /// Check if this is an invalid address error
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, NavKeysError::InvalidUrl { .. })
    }
}

impl fmt::Display for NavKeysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavKeysError::InvalidUrl { input, source } => {
                write!(f, "Invalid address '{}': {}", input, source)
            }
            NavKeysError::Exited => write!(f, "Navigation controller has exited"),
        }
    }
}

impl std::error::Error for NavKeysError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavKeysError::InvalidUrl { source, .. } => Some(source),
            NavKeysError::Exited => None,
        }
    }
}

/// Resolve `input` against `base` the way the host resolves relative addresses.
pub(crate) fn resolve_url(base: &url::Url, input: &str) -> Result<url::Url, NavKeysError> {
    base.join(input)
        .map_err(|source| NavKeysError::invalid_url(input, source))
}
