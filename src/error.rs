//! Error types for adaptive rejection Metropolis sampling.

use thiserror::Error;

/// Everything that can go wrong while building an envelope or drawing from it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArmsError {
    /// Malformed initial points, bounds, capacity, convexity or attempt cap.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The envelope no longer bounds the log-density. Without Metropolis
    /// correction this means the target is not log-concave.
    #[error("Envelope violation: {0}")]
    EnvelopeViolation(String),

    /// A computed abscissa fell outside the interval it was derived from.
    #[error("Numeric guard tripped: x = {x} outside [{lower}, {upper}]")]
    NumericGuardTripped { x: f64, lower: f64, upper: f64 },

    /// The draw loop rejected every candidate it was allowed to try.
    #[error("Sampler exhausted after {attempts} rejected candidates")]
    SamplerExhausted { attempts: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ArmsError>;
