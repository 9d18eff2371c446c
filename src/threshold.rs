// Short-track threshold resolution
// Decides below which duration the host's own scrobbler ignores a track

use thiserror::Error;

/// Built-in cutoff observed on hosts up to API revision 55
pub const DEFAULT_THRESHOLD_MS: f64 = 29963.0;

/// Built-in cutoff observed on hosts after API revision 55
pub const DEFAULT_THRESHOLD_MS_BETA: f64 = 29467.0;

/// Last API revision that still uses [`DEFAULT_THRESHOLD_MS`]
pub const API_REVISION_BOUNDARY: i32 = 55;

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("threshold override '{0}' is not a number")]
    NotANumber(String),

    #[error("threshold override {0} must be a positive, finite number of milliseconds")]
    OutOfRange(f64),
}

/// Parse a user override. Empty (or whitespace) means no override.
pub fn parse_override(value: &str) -> Result<Option<f64>, ThresholdError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let ms: f64 = value
        .parse()
        .map_err(|_| ThresholdError::NotANumber(value.to_string()))?;

    if !ms.is_finite() || ms <= 0.0 {
        return Err(ThresholdError::OutOfRange(ms));
    }

    Ok(Some(ms))
}

/// Default threshold for a host API revision
pub fn default_for(api_revision: i32) -> f64 {
    if api_revision > API_REVISION_BOUNDARY {
        DEFAULT_THRESHOLD_MS_BETA
    } else {
        DEFAULT_THRESHOLD_MS
    }
}

/// Resolves the active threshold from the stored override and the host revision
#[derive(Debug, Clone, Copy)]
pub struct ThresholdResolver<'a> {
    user_override: &'a str,
    api_revision: i32,
}

impl<'a> ThresholdResolver<'a> {
    pub fn new(user_override: &'a str, api_revision: i32) -> Self {
        Self {
            user_override,
            api_revision,
        }
    }

    /// Active threshold in milliseconds. Never fails: a bad override falls back to the default.
    pub fn resolve(&self) -> f64 {
        match parse_override(self.user_override) {
            Ok(Some(ms)) => ms,
            Ok(None) => self.default_threshold(),
            Err(e) => {
                log::warn!("Ignoring {}", e);
                self.default_threshold()
            }
        }
    }

    pub fn default_threshold(&self) -> f64 {
        default_for(self.api_revision)
    }
}
