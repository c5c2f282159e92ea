//! Built-in converters for scalar host types.
//!
//! Narrow integer types widen losslessly on the way out and range-check on
//! the way back; `f32` widens losslessly and narrows with the usual float
//! rounding, matching how the store only ever holds `i64` and `f64`.

use std::any::{type_name, Any};

use entimap_value::{Key, Value, ValueKind};

use crate::convert::{downcast_host, ValueConverter};
use crate::error::{ConversionError, ConversionResult};

/// Converter between `String` and text values.
pub struct TextConverter;

/// Shared instance of [`TextConverter`].
pub static TEXT: TextConverter = TextConverter;

impl ValueConverter for TextConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn host_type(&self) -> &'static str {
        type_name::<String>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let text = downcast_host::<String>(host)?;
        Ok(Value::Text(text.clone()))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let text = native
            .as_text()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Text, native.kind()))?;
        Ok(Box::new(text.to_owned()))
    }
}

/// Converter between `i64` and integer values.
pub struct IntegerConverter;

/// Shared instance of [`IntegerConverter`].
pub static INTEGER: IntegerConverter = IntegerConverter;

impl ValueConverter for IntegerConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn host_type(&self) -> &'static str {
        type_name::<i64>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let n = downcast_host::<i64>(host)?;
        Ok(Value::Integer(*n))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let n = native
            .as_integer()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Integer, native.kind()))?;
        Ok(Box::new(n))
    }
}

/// Converter between `i32` and integer values.
///
/// Encoding widens; decoding fails if the stored value does not fit.
pub struct Int32Converter;

/// Shared instance of [`Int32Converter`].
pub static INT32: Int32Converter = Int32Converter;

impl ValueConverter for Int32Converter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn host_type(&self) -> &'static str {
        type_name::<i32>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let n = downcast_host::<i32>(host)?;
        Ok(Value::Integer(i64::from(*n)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let n = native
            .as_integer()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Integer, native.kind()))?;
        let narrowed =
            i32::try_from(n).map_err(|_| ConversionError::out_of_range(n, "i32"))?;
        Ok(Box::new(narrowed))
    }
}

/// Converter between `i16` and integer values.
///
/// Encoding widens; decoding fails if the stored value does not fit.
pub struct Int16Converter;

/// Shared instance of [`Int16Converter`].
pub static INT16: Int16Converter = Int16Converter;

impl ValueConverter for Int16Converter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn host_type(&self) -> &'static str {
        type_name::<i16>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let n = downcast_host::<i16>(host)?;
        Ok(Value::Integer(i64::from(*n)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let n = native
            .as_integer()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Integer, native.kind()))?;
        let narrowed =
            i16::try_from(n).map_err(|_| ConversionError::out_of_range(n, "i16"))?;
        Ok(Box::new(narrowed))
    }
}

/// Converter between `bool` and boolean values.
pub struct BoolConverter;

/// Shared instance of [`BoolConverter`].
pub static BOOL: BoolConverter = BoolConverter;

impl ValueConverter for BoolConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn host_type(&self) -> &'static str {
        type_name::<bool>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let b = downcast_host::<bool>(host)?;
        Ok(Value::Bool(*b))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let b = native
            .as_bool()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Bool, native.kind()))?;
        Ok(Box::new(b))
    }
}

/// Converter between `f64` and double values.
pub struct DoubleConverter;

/// Shared instance of [`DoubleConverter`].
pub static DOUBLE: DoubleConverter = DoubleConverter;

impl ValueConverter for DoubleConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn host_type(&self) -> &'static str {
        type_name::<f64>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let d = downcast_host::<f64>(host)?;
        Ok(Value::Double(*d))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let d = native
            .as_double()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Double, native.kind()))?;
        Ok(Box::new(d))
    }
}

/// Converter between `f32` and double values.
///
/// Decoding narrows with IEEE rounding rather than failing; doubles outside
/// the `f32` range come back infinite.
pub struct FloatConverter;

/// Shared instance of [`FloatConverter`].
pub static FLOAT: FloatConverter = FloatConverter;

impl ValueConverter for FloatConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn host_type(&self) -> &'static str {
        type_name::<f32>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let d = downcast_host::<f32>(host)?;
        Ok(Value::Double(f64::from(*d)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let d = native
            .as_double()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Double, native.kind()))?;
        Ok(Box::new(d as f32))
    }
}

/// Converter between `Vec<u8>` and byte string values.
pub struct BytesConverter;

/// Shared instance of [`BytesConverter`].
pub static BYTES: BytesConverter = BytesConverter;

impl ValueConverter for BytesConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Bytes
    }

    fn host_type(&self) -> &'static str {
        type_name::<Vec<u8>>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let bytes = downcast_host::<Vec<u8>>(host)?;
        Ok(Value::Bytes(bytes.clone()))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let bytes = native
            .as_bytes()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Bytes, native.kind()))?;
        Ok(Box::new(bytes.to_vec()))
    }
}

/// Converter between [`Key`] and key reference values.
pub struct KeyConverter;

/// Shared instance of [`KeyConverter`].
pub static KEY: KeyConverter = KeyConverter;

impl ValueConverter for KeyConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::KeyRef
    }

    fn host_type(&self) -> &'static str {
        type_name::<Key>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let key = downcast_host::<Key>(host)?;
        Ok(Value::KeyRef(key.clone()))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let key = native
            .as_key()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::KeyRef, native.kind()))?;
        Ok(Box::new(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip<T: PartialEq + std::fmt::Debug + 'static>(
        converter: &dyn ValueConverter,
        host: T,
    ) -> T {
        let native = converter.encode(&host).unwrap();
        let back = converter.decode(&native).unwrap();
        *back.downcast::<T>().unwrap()
    }

    #[test]
    fn scalars_round_trip() {
        assert_eq!(round_trip(&TEXT, "hello".to_string()), "hello");
        assert_eq!(round_trip(&INTEGER, -7i64), -7);
        assert_eq!(round_trip(&INT32, 1_000_000i32), 1_000_000);
        assert_eq!(round_trip(&INT16, -42i16), -42);
        assert!(round_trip(&BOOL, true));
        assert_eq!(round_trip(&DOUBLE, 2.5f64), 2.5);
        assert_eq!(round_trip(&BYTES, vec![0u8, 255, 3]), vec![0, 255, 3]);
        assert_eq!(
            round_trip(&KEY, Key::numeric("User", 9)),
            Key::numeric("User", 9)
        );
    }

    #[test]
    fn narrow_integers_widen_on_encode() {
        assert_eq!(INT16.encode(&5i16).unwrap(), Value::Integer(5));
        assert_eq!(INT32.encode(&5i32).unwrap(), Value::Integer(5));
    }

    #[test]
    fn narrow_integers_range_check_on_decode() {
        let err = INT16.decode(&Value::Integer(40_000)).unwrap_err();
        assert_eq!(err.to_string(), "value 40000 is out of range for i16");

        let err = INT32.decode(&Value::Integer(i64::MAX)).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::OutOfRange { target: "i32", .. }
        ));

        assert_eq!(
            *INT16
                .decode(&Value::Integer(-32_768))
                .unwrap()
                .downcast::<i16>()
                .unwrap(),
            i16::MIN
        );
    }

    #[test]
    fn float_narrows_with_rounding() {
        assert_eq!(FLOAT.encode(&1.5f32).unwrap(), Value::Double(1.5));

        let narrowed = FLOAT.decode(&Value::Double(f64::MAX)).unwrap();
        assert!(narrowed.downcast::<f32>().unwrap().is_infinite());
    }

    #[test]
    fn kind_mismatches_are_reported() {
        let err = TEXT.decode(&Value::Integer(1)).unwrap_err();
        assert_eq!(err.to_string(), "expecting text, but found integer");

        let err = KEY.decode(&Value::Text("x".into())).unwrap_err();
        assert_eq!(err.to_string(), "expecting key, but found text");
    }

    #[test]
    fn wrong_host_type_is_reported() {
        let err = TEXT.encode(&42i64).unwrap_err();
        assert!(matches!(err, ConversionError::HostType { .. }));
    }

    proptest! {
        #[test]
        fn narrow_integers_survive_widening(n in any::<i16>()) {
            prop_assert_eq!(round_trip(&INT16, n), n);
        }

        #[test]
        fn in_range_stored_integers_narrow_back(n in i64::from(i32::MIN)..=i64::from(i32::MAX)) {
            let back = INT32.decode(&Value::Integer(n)).unwrap();
            prop_assert_eq!(*back.downcast::<i32>().unwrap(), n as i32);
        }

        #[test]
        fn out_of_range_stored_integers_fail_narrowing(n in any::<i64>()) {
            prop_assume!(i32::try_from(n).is_err());
            prop_assert!(INT32.decode(&Value::Integer(n)).is_err());
        }
    }
}
