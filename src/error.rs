//! Error types for tickflow.
//!
//! Errors are strongly typed using thiserror. Note what is *not* here:
//! basket accessors and boundary resolution never fail, and "no sample at
//! this boundary" is an empty result rather than an error.

use thiserror::Error;

use crate::history::HistoryError;

/// Validation errors raised while checking configuration or decoding values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A retention limit is unusable.
    #[error("Invalid history configuration: {reason}")]
    InvalidHistoryConfig {
        /// Which limit failed and why.
        reason: String,
    },

    /// A raw discriminant matched no member of a mirrored enum.
    #[error("Unknown {enum_name} discriminant: {value}")]
    UnknownDiscriminant {
        /// Enum being decoded.
        enum_name: &'static str,
        /// Rejected raw value.
        value: u8,
    },

    /// A policy name failed to parse.
    #[error("Unknown time index policy '{name}'")]
    UnknownPolicyName {
        /// Rejected input.
        name: String,
    },
}

/// Top-level error type for tickflow.
#[derive(Debug, Error)]
pub enum TickflowError {
    /// Configuration or decoding failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// History store failure.
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

impl TickflowError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a history store error.
    #[must_use]
    pub const fn is_history(&self) -> bool {
        matches!(self, Self::History(_))
    }
}

/// Result type alias for tickflow operations.
pub type TickflowResult<T> = Result<T, TickflowError>;
