//! Error types for analysis.

use thiserror::Error;

/// Errors raised while configuring an analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// A junk pattern is not a valid glob.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
