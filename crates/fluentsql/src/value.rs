//! Scalar parameter values and the ordered parameter map.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Named parameters, keyed by placeholder name (without the leading `:`).
///
/// Iteration follows insertion order; inserting an existing key overwrites
/// its value in place.
pub type Params = IndexMap<String, Value>;

/// A scalar value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Json(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a [`Params`] map, preserving the written order.
///
/// ```ignore
/// let p = fluentsql::params! { "name" => "alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $(
            params.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        params
    }};
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use rust_decimal::Decimal;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    type BoxError = Box<dyn Error + Sync + Send>;

    /// Largest integer magnitudes that `f32` / `f64` represent exactly.
    const F32_EXACT: u64 = 1 << 24;
    const F64_EXACT: u64 = 1 << 53;

    fn mismatch(value: &Value, ty: &Type) -> BoxError {
        format!("cannot bind {} value to a parameter of type {}", value.type_name(), ty).into()
    }

    fn encode<T: ToSql>(
        inner: &T,
        value: &Value,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, BoxError> {
        if T::accepts(ty) {
            inner.to_sql(ty, out)
        } else {
            Err(mismatch(value, ty))
        }
    }

    /// `v` as `f64`, or an error if the float type would round it.
    fn exact_float(v: i64, limit: u64, ty: &Type) -> Result<f64, BoxError> {
        if v.unsigned_abs() > limit {
            return Err(format!("integer {v} cannot be represented exactly as {ty}").into());
        }
        Ok(v as f64)
    }

    impl ToSql for Value {
        fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => encode(v, self, ty, out),
                Value::Int(v) => match *ty {
                    Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                    Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                    Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                    Type::FLOAT4 => (exact_float(*v, F32_EXACT, ty)? as f32).to_sql(ty, out),
                    Type::FLOAT8 => exact_float(*v, F64_EXACT, ty)?.to_sql(ty, out),
                    Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                    _ if <&str as ToSql>::accepts(ty) => v.to_string().as_str().to_sql(ty, out),
                    _ => encode(v, self, ty, out),
                },
                Value::Float(v) => match *ty {
                    Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                    Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                    _ if <&str as ToSql>::accepts(ty) => v.to_string().as_str().to_sql(ty, out),
                    _ => encode(v, self, ty, out),
                },
                Value::Text(v) => encode(&v.as_str(), self, ty, out),
                Value::Bytes(v) => encode(&v.as_slice(), self, ty, out),
                Value::Json(v) => encode(v, self, ty, out),
                Value::Uuid(v) => encode(v, self, ty, out),
                Value::Timestamp(v) => match *ty {
                    Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                    Type::DATE => v.date_naive().to_sql(ty, out),
                    _ => encode(v, self, ty, out),
                },
            }
        }

        // Per-variant checks happen in `to_sql`.
        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }
}
