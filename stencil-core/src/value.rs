use crate::{Error, Result};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow, sync::Arc};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Dynamically typed SQL value, used both for statement parameters and for result rows.
///
/// Every variant carries an `Option`: `None` is a typed NULL, [`Value::Null`] is the untyped one.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int8(None)
                | Value::Int16(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::UInt8(None)
                | Value::UInt16(None)
                | Value::UInt32(None)
                | Value::UInt64(None)
                | Value::Float32(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::Uuid(None)
        )
    }

    fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Int8(Some(v)) => *v as i128,
            Value::Int16(Some(v)) => *v as i128,
            Value::Int32(Some(v)) => *v as i128,
            Value::Int64(Some(v)) => *v as i128,
            Value::UInt8(Some(v)) => *v as i128,
            Value::UInt16(Some(v)) => *v as i128,
            Value::UInt32(Some(v)) => *v as i128,
            Value::UInt64(Some(v)) => *v as i128,
            _ => return None,
        })
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} to {}",
        value,
        any::type_name::<T>()
    ))
}

/// Conversion between native Rust types and [`Value`].
///
/// Decoding is lenient where drivers commonly disagree on the representation: integers of any
/// width are accepted (range checked), booleans can come as integers and temporal or uuid values
/// can come as text.
pub trait AsValue {
    /// NULL of the variant this type maps to.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

macro_rules! impl_as_value_integer {
    ($source:ty, $variant:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                Value::$variant(None)
            }
            fn as_value(self) -> Value {
                Value::$variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Value::$variant(Some(v)) = value {
                    return Ok(v);
                }
                value
                    .as_i128()
                    .and_then(|v| <$source>::try_from(v).ok())
                    .ok_or_else(|| conversion_error::<Self>(&value))
            }
        }
    };
}

impl_as_value_integer!(i8, Int8);
impl_as_value_integer!(i16, Int16);
impl_as_value_integer!(i32, Int32);
impl_as_value_integer!(i64, Int64);
impl_as_value_integer!(u8, UInt8);
impl_as_value_integer!(u16, UInt16);
impl_as_value_integer!(u32, UInt32);
impl_as_value_integer!(u64, UInt64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            ref v => match v.as_i128() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(conversion_error::<Self>(v)),
            },
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float32(None)
    }
    fn as_value(self) -> Value {
        Value::Float32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v),
            Value::Float64(Some(v)) => Ok(v as f32),
            Value::Decimal(Some(v)) => v.to_f32().ok_or_else(|| conversion_error::<Self>(&value)),
            ref v => v
                .as_i128()
                .map(|v| v as f32)
                .ok_or_else(|| conversion_error::<Self>(v)),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Ok(v as f64),
            Value::Decimal(Some(v)) => v.to_f64().ok_or_else(|| conversion_error::<Self>(&value)),
            ref v => v
                .as_i128()
                .map(|v| v as f64)
                .ok_or_else(|| conversion_error::<Self>(v)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => v
                .parse::<Decimal>()
                .map_err(|_| conversion_error::<Self>(&value)),
            ref v => v
                .as_i128()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| conversion_error::<Self>(v)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl AsValue for Arc<str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.as_ref().into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => {
                Date::parse(v.trim(), format_description!("[year]-[month]-[day]"))
                    .map_err(|_| conversion_error::<Self>(&value))
            }
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Time::parse(
                v.trim(),
                format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]"),
            )
            .map_err(|_| conversion_error::<Self>(&value)),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => PrimitiveDateTime::parse(
                &v.trim().replacen('T', " ", 1),
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
                ),
            )
            .map_err(|_| conversion_error::<Self>(&value)),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Uuid::parse_str(v.trim()).map_err(|_| conversion_error::<Self>(&value))
            }
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).map_err(|_| conversion_error::<Self>(&value))
            }
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::{AsValue, Value};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{
        Date, PrimitiveDateTime, Time,
        macros::{date, datetime, time},
    };
    use uuid::Uuid;

    #[test]
    fn integers_accept_any_width_in_range() {
        assert_eq!(i64::try_from_value(Value::Int8(Some(-3))).unwrap(), -3);
        assert_eq!(u8::try_from_value(Value::Int64(Some(200))).unwrap(), 200);
        assert!(u8::try_from_value(Value::Int64(Some(300))).is_err());
        assert!(u32::try_from_value(Value::Int32(Some(-1))).is_err());
        assert!(i32::try_from_value(Value::Varchar(Some("1".into()))).is_err());
    }

    #[test]
    fn booleans_from_integers() {
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::UInt8(Some(0))).unwrap());
        assert!(bool::try_from_value(Value::Int64(Some(2))).is_err());
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::try_from_value(Value::Int64(None)).unwrap(), None);
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(Some(5))).unwrap(),
            Some(5)
        );
        assert_eq!(Option::<String>::None.as_value(), Value::Varchar(None));
        assert!(String::try_from_value(Value::Null).is_err());
    }

    #[test]
    fn text_encoded_values() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2025-03-14".into()))).unwrap(),
            date!(2025 - 03 - 14)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar(Some("10:11:12.5".into()))).unwrap(),
            time!(10:11:12.5)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2025-03-14T10:11:12".into()
            )))
            .unwrap(),
            datetime!(2025-03-14 10:11:12)
        );
        let uuid = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("12.50".into()))).unwrap(),
            Decimal::new(1250, 2)
        );
    }

    #[test]
    fn null_detection() {
        assert!(Value::Null.is_null());
        assert!(Value::Uuid(None).is_null());
        assert!(!Value::Boolean(Some(false)).is_null());
    }
}
