//! Error types for the native value model.

use thiserror::Error;

/// Result type for value model operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised by the native value model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A timestamp cannot be expanded to a calendar datetime.
    #[error("timestamp of {micros} microseconds is outside the representable datetime range")]
    TimestampOutOfRange {
        /// The offending microsecond count.
        micros: i64,
    },
}

impl ValueError {
    /// Create a timestamp out-of-range error.
    pub fn timestamp_out_of_range(micros: i64) -> Self {
        Self::TimestampOutOfRange { micros }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValueError::timestamp_out_of_range(i64::MIN);
        assert!(err.to_string().contains("outside the representable"));
    }
}
