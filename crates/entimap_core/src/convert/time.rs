//! Built-in converters for timestamp host types.
//!
//! All three converters share the same native representation, a microsecond
//! timestamp. Datetimes lose their zone on the way in; the two `chrono`
//! converters differ only in which zone they reconstitute the instant in.

use std::any::{type_name, Any};

use chrono::{DateTime, Local, Utc};
use entimap_value::{Timestamp, Value, ValueKind};

use crate::convert::{downcast_host, ValueConverter};
use crate::error::{ConversionError, ConversionResult};

/// Converter between [`Timestamp`] and timestamp values.
pub struct TimestampConverter;

/// Shared instance of [`TimestampConverter`].
pub static TIMESTAMP: TimestampConverter = TimestampConverter;

impl ValueConverter for TimestampConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Timestamp
    }

    fn host_type(&self) -> &'static str {
        type_name::<Timestamp>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let ts = downcast_host::<Timestamp>(host)?;
        Ok(Value::Timestamp(*ts))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let ts = native
            .as_timestamp()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Timestamp, native.kind()))?;
        Ok(Box::new(ts))
    }
}

/// Converter between `DateTime<Utc>` and timestamp values.
pub struct DateTimeUtcConverter;

/// Shared instance of [`DateTimeUtcConverter`].
pub static DATETIME_UTC: DateTimeUtcConverter = DateTimeUtcConverter;

impl ValueConverter for DateTimeUtcConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Timestamp
    }

    fn host_type(&self) -> &'static str {
        type_name::<DateTime<Utc>>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let dt = downcast_host::<DateTime<Utc>>(host)?;
        Ok(Value::Timestamp(Timestamp::from_datetime(dt)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let ts = native
            .as_timestamp()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Timestamp, native.kind()))?;
        let dt = ts.to_utc()?;
        Ok(Box::new(dt))
    }
}

/// Converter between `DateTime<Local>` and timestamp values.
///
/// Reads reconstitute the instant in the system-default zone, whatever zone
/// the written datetime carried.
pub struct DateTimeLocalConverter;

/// Shared instance of [`DateTimeLocalConverter`].
pub static DATETIME_LOCAL: DateTimeLocalConverter = DateTimeLocalConverter;

impl ValueConverter for DateTimeLocalConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Timestamp
    }

    fn host_type(&self) -> &'static str {
        type_name::<DateTime<Local>>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let dt = downcast_host::<DateTime<Local>>(host)?;
        Ok(Value::Timestamp(Timestamp::from_datetime(dt)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let ts = native
            .as_timestamp()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Timestamp, native.kind()))?;
        let dt = ts.to_local()?;
        Ok(Box::new(dt))
    }
}
