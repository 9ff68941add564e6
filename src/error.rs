//! Error types for topology parsing and routing.

use thiserror::Error;

/// Result type alias for shardmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for topology parsing and routing.
#[derive(Error, Debug)]
pub enum Error {
    /// The input document is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document is well-formed but violates the topology schema.
    #[error("validation error: {0}")]
    Validation(String),

    /// The raw document exceeds the configured size cap.
    #[error("config of {size} bytes exceeds limit of {limit} bytes")]
    SizeLimit { size: usize, limit: usize },

    /// A caller-supplied index is outside the topology's valid range.
    #[error("misuse: {0}")]
    Misuse(#[from] MisuseError),
}

/// Caller errors: indices or operations that do not fit this topology.
///
/// These are asserted explicitly rather than trusted, so a bad index
/// surfaces as an error instead of a panic or a silent wild read.
#[derive(Error, Debug)]
pub enum MisuseError {
    /// Partition id outside `0..num_vbuckets`.
    #[error("vbucket {vbucket} out of range, topology has {num_vbuckets}")]
    VbucketOutOfRange { vbucket: u32, num_vbuckets: u32 },

    /// Server index outside `0..num_servers`.
    #[error("server index {server} out of range, topology has {num_servers}")]
    ServerOutOfRange { server: usize, num_servers: usize },

    /// A partition-map-only operation was invoked on a ring topology.
    #[error("operation requires a vbucket topology, this one uses ketama")]
    NotVbucketDistribution,
}

impl Error {
    /// Shorthand for a validation failure with a descriptive message.
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::SizeLimit {
            size: 200,
            limit: 100,
        };
        assert!(err.to_string().contains("200"));
        assert!(err.to_string().contains("100"));

        let err: Error = MisuseError::VbucketOutOfRange {
            vbucket: 9,
            num_vbuckets: 4,
        }
        .into();
        assert!(matches!(err, Error::Misuse(_)));
        assert!(err.to_string().contains("vbucket 9"));
    }
}
