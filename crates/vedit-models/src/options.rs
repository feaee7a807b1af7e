//! Edit options supplied with an edit request.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest target height an edit may request.
pub const MIN_TARGET_HEIGHT: u32 = 144;

/// Errors produced by [`EditOptions::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("trim start must be a non-negative number, got {0}")]
    InvalidTrimStart(f64),

    #[error("trim end must be a non-negative number, got {0}")]
    InvalidTrimEnd(f64),

    #[error("trim end ({end}) must be greater than trim start ({start})")]
    InvertedTrimRange { start: f64, end: f64 },

    #[error("target height {0} is below the minimum of {MIN_TARGET_HEIGHT}")]
    TargetHeightTooSmall(u32),
}

/// Caller-supplied options for one edit job.
///
/// Constructed by the caller, validated once at job entry, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditOptions {
    /// Seek position in seconds, applied before the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,

    /// End position in seconds; must exceed `trim_start` when both are set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,

    /// Drop the audio stream entirely
    pub mute: bool,

    /// Rescale to this output height, preserving aspect ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_height: Option<u32>,
}

impl EditOptions {
    /// Validate the options before any side effect.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(start) = self.trim_start {
            if !start.is_finite() || start < 0.0 {
                return Err(OptionsError::InvalidTrimStart(start));
            }
        }
        if let Some(end) = self.trim_end {
            if !end.is_finite() || end < 0.0 {
                return Err(OptionsError::InvalidTrimEnd(end));
            }
        }
        if let (Some(start), Some(end)) = (self.trim_start, self.trim_end) {
            if end <= start {
                return Err(OptionsError::InvertedTrimRange { start, end });
            }
        }
        if let Some(height) = self.target_height {
            if height < MIN_TARGET_HEIGHT {
                return Err(OptionsError::TargetHeightTooSmall(height));
            }
        }
        Ok(())
    }
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            trim_start: None,
            trim_end: None,
            mute: false,
            target_height: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_valid() {
        assert!(EditOptions::default().validate().is_ok());
    }

    #[test]
    fn test_valid_trim_range() {
        let opts = EditOptions {
            trim_start: Some(10.0),
            trim_end: Some(20.0),
            mute: false,
            target_height: Some(720),
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_inverted_trim_range_rejected() {
        let opts = EditOptions {
            trim_start: Some(20.0),
            trim_end: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            opts.validate(),
            Err(OptionsError::InvertedTrimRange {
                start: 20.0,
                end: 10.0
            })
        );
    }

    #[test]
    fn test_equal_trim_bounds_rejected() {
        let opts = EditOptions {
            trim_start: Some(5.0),
            trim_end: Some(5.0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_negative_and_nan_trims_rejected() {
        let opts = EditOptions {
            trim_start: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(OptionsError::InvalidTrimStart(_))
        ));

        let opts = EditOptions {
            trim_end: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(OptionsError::InvalidTrimEnd(_))
        ));
    }

    #[test]
    fn test_target_height_floor() {
        let opts = EditOptions {
            target_height: Some(100),
            ..Default::default()
        };
        assert_eq!(opts.validate(), Err(OptionsError::TargetHeightTooSmall(100)));

        let opts = EditOptions {
            target_height: Some(MIN_TARGET_HEIGHT),
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_single_trim_bound_allowed() {
        let opts = EditOptions {
            trim_end: Some(30.0),
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }
}
