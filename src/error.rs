//! Error types for evergreen.
//!
//! Errors only arise while building a scene: tuning values that make no sense
//! and preset files that cannot be read. The per-frame path never fails; a
//! degenerate entity is snapped back to rest instead.

use std::fmt;

/// Invalid tuning value in a layer or preset configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value that must be finite and strictly positive was not.
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A value that must be finite and non-negative was not.
    Negative {
        field: &'static str,
        value: f32,
    },
    /// A value that may take any sign but must be finite was NaN or infinite.
    NotFinite {
        field: &'static str,
        value: f32,
    },
    /// A `min..max` range with `min >= max` or non-finite bounds.
    EmptyRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    /// Damping factor outside `(0, 1]`.
    Damping(f32),
    /// A value that must lie in `[0, 1]` did not.
    OutOfUnitRange {
        field: &'static str,
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotPositive { field, value } => {
                write!(f, "`{}` must be a positive finite number, got {}", field, value)
            }
            ConfigError::Negative { field, value } => {
                write!(f, "`{}` must be a non-negative finite number, got {}", field, value)
            }
            ConfigError::NotFinite { field, value } => {
                write!(f, "`{}` must be a finite number, got {}", field, value)
            }
            ConfigError::EmptyRange { field, min, max } => {
                write!(f, "`{}` range {}..{} is empty", field, min, max)
            }
            ConfigError::Damping(value) => {
                write!(f, "damping factor must lie in (0, 1], got {}", value)
            }
            ConfigError::OutOfUnitRange { field, value } => {
                write!(f, "`{}` must lie in [0, 1], got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::NotPositive { field, value })
        }
    }

    pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::Negative { field, value })
        }
    }

    pub(crate) fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::NotFinite { field, value })
        }
    }

    pub(crate) fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::OutOfUnitRange { field, value })
        }
    }

    pub(crate) fn range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
        if min.is_finite() && max.is_finite() && min < max {
            Ok(())
        } else {
            Err(ConfigError::EmptyRange { field, min, max })
        }
    }
}

/// Errors that can occur when loading a [`VisualPreset`](crate::VisualPreset).
#[derive(Debug)]
pub enum PresetError {
    /// Failed to read the preset file from disk.
    Io(std::io::Error),
    /// The file is not a valid preset document.
    Json(serde_json::Error),
    /// The preset parsed but carries invalid values.
    Invalid(ConfigError),
    /// No built-in preset has this name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::Io(e) => write!(f, "Failed to read preset file: {}", e),
            PresetError::Json(e) => write!(f, "Failed to parse preset: {}", e),
            PresetError::Invalid(e) => write!(f, "Invalid preset: {}", e),
            PresetError::UnknownPreset(name) => {
                write!(f, "Unknown preset `{}` (expected `grand` or `tap`)", name)
            }
        }
    }
}

impl std::error::Error for PresetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresetError::Io(e) => Some(e),
            PresetError::Json(e) => Some(e),
            PresetError::Invalid(e) => Some(e),
            PresetError::UnknownPreset(_) => None,
        }
    }
}

impl From<std::io::Error> for PresetError {
    fn from(e: std::io::Error) -> Self {
        PresetError::Io(e)
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(e: serde_json::Error) -> Self {
        PresetError::Json(e)
    }
}

impl From<ConfigError> for PresetError {
    fn from(e: ConfigError) -> Self {
        PresetError::Invalid(e)
    }
}
