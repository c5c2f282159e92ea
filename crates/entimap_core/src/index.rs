//! Secondary index derivation.
//!
//! A secondary index stores a derived form of a property under its own
//! stored name, next to the primary property. Derivation runs during
//! marshalling only; reads ignore secondary properties entirely.

use entimap_value::{Value, ValueKind};

use crate::error::{ConversionError, ConversionResult};

/// Derives the stored form of a secondary index from a primary value.
///
/// Indexers see the already converted native value, including explicit
/// nulls. Most indexers pass null through so an unset property indexes as
/// unset.
pub trait SecondaryIndexer: Send + Sync {
    /// Derives the indexed value.
    fn index(&self, value: &Value) -> ConversionResult<Value>;
}

/// Indexes text case-insensitively by storing its lowercased form.
pub struct LowercaseIndexer;

impl SecondaryIndexer for LowercaseIndexer {
    fn index(&self, value: &Value) -> ConversionResult<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => Ok(Value::Text(text.to_lowercase())),
            other => Err(ConversionError::unexpected_kind(
                ValueKind::Text,
                other.kind(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_text() {
        let derived = LowercaseIndexer
            .index(&Value::Text("John Doe".to_string()))
            .unwrap();
        assert_eq!(derived, Value::Text("john doe".to_string()));
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(LowercaseIndexer.index(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn non_text_is_rejected() {
        let err = LowercaseIndexer.index(&Value::Integer(3)).unwrap_err();
        assert_eq!(err.to_string(), "expecting text, but found integer");
    }
}
