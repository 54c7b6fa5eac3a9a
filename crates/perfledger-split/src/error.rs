//! Split engine error types.

use thiserror::Error;

/// Error returned when a split cannot be configured.
///
/// Data problems in the ledger itself (unknown accounts, missing prices,
/// an empty window) are never errors; they surface as empty deltas or as a
/// non-zero reconciliation difference instead.
#[derive(Debug, Error)]
pub enum SplitError {
    /// A category id that no accumulator implements.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// An interval id that is not one of the supported granularities.
    #[error("unknown interval: {0}")]
    UnknownInterval(String),
    /// An account pattern that is not a valid regular expression.
    #[error("invalid account pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}
