//! Runtime literal values and their host types.
//!
//! [`Value`] is what a literal node carries and what the binder hands to a
//! [`BindSink`](crate::render::BindSink). It renders itself as an inline SQL
//! literal for a dialect and implements [`ToSql`] so a collected parameter list
//! can be passed straight to `tokio-postgres`.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::error::Error;
use std::fmt::Write;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

use crate::config::Dialect;

/// Host-side type of a value or column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Decimal,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    /// Array of an element type.
    Array(Box<HostType>),
}

/// A runtime SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Host type of this value, `None` for an untyped NULL.
    pub fn host_type(&self) -> Option<HostType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => HostType::Bool,
            Value::SmallInt(_) => HostType::SmallInt,
            Value::Int(_) => HostType::Int,
            Value::BigInt(_) => HostType::BigInt,
            Value::Real(_) => HostType::Real,
            Value::Double(_) => HostType::Double,
            #[cfg(feature = "rust_decimal")]
            Value::Decimal(_) => HostType::Decimal,
            Value::Text(_) => HostType::Text,
            Value::Bytes(_) => HostType::Bytes,
            Value::Date(_) => HostType::Date,
            Value::Time(_) => HostType::Time,
            Value::Timestamp(_) => HostType::Timestamp,
            Value::TimestampTz(_) => HostType::TimestampTz,
            Value::Uuid(_) => HostType::Uuid,
            Value::Json(_) => HostType::Json,
        })
    }

    /// Render this value as an inline SQL literal.
    pub fn to_literal(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.write_literal(dialect, &mut out);
        out
    }

    pub(crate) fn write_literal(&self, dialect: Dialect, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(dialect.boolean_literal(*v)),
            Value::SmallInt(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Int(v) => {
                let _ = write!(out, "{v}");
            }
            Value::BigInt(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Real(v) if v.is_finite() => {
                let _ = write!(out, "{v}");
            }
            Value::Double(v) if v.is_finite() => {
                let _ = write!(out, "{v}");
            }
            Value::Real(v) => write_non_finite(dialect, f64::from(*v), out),
            Value::Double(v) => write_non_finite(dialect, *v, out),
            #[cfg(feature = "rust_decimal")]
            Value::Decimal(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Text(s) => write_string(dialect, s, out),
            Value::Bytes(b) => write_bytes(dialect, b, out),
            Value::Date(d) => write_string(dialect, &d.format("%Y-%m-%d").to_string(), out),
            Value::Time(t) => write_string(dialect, &t.format("%H:%M:%S%.f").to_string(), out),
            Value::Timestamp(ts) => {
                write_string(dialect, &ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(), out)
            }
            Value::TimestampTz(ts) => write_string(
                dialect,
                &ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
                out,
            ),
            Value::Uuid(u) => write_string(dialect, &u.to_string(), out),
            Value::Json(v) => write_string(dialect, &v.to_string(), out),
        }
    }
}

/// NaN and the infinities as the string literals PostgreSQL casts to float.
fn write_non_finite(dialect: Dialect, v: f64, out: &mut String) {
    let text = match v {
        v if v.is_nan() => "NaN",
        v if v > 0.0 => "Infinity",
        _ => "-Infinity",
    };
    write_string(dialect, text, out);
}

fn write_string(dialect: Dialect, s: &str, out: &mut String) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' if dialect == Dialect::MySql => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn write_bytes(dialect: Dialect, bytes: &[u8], out: &mut String) {
    match dialect {
        Dialect::Postgres => out.push_str("'\\x"),
        Dialect::SqlServer => out.push_str("0x"),
        _ => out.push_str("X'"),
    }
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    if dialect != Dialect::SqlServer {
        out.push('\'');
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::SmallInt(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => v.to_sql_checked(ty, out),
            Value::BigInt(v) => v.to_sql_checked(ty, out),
            Value::Real(v) => v.to_sql_checked(ty, out),
            Value::Double(v) => v.to_sql_checked(ty, out),
            #[cfg(feature = "rust_decimal")]
            Value::Decimal(v) => v.to_sql_checked(ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    // Every variant already delegates to the checked conversion of its inner type.
    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

/// Rust types usable as typed field/literal values.
pub trait SqlType: Send + Sync + 'static {
    /// The host type this Rust type maps to.
    fn host_type() -> HostType;

    /// Convert into a runtime value.
    fn into_value(self) -> Value;
}

/// Marker for numeric host types (arithmetic, `sum`, `avg`).
pub trait Numeric: SqlType {}

macro_rules! sql_type {
    ($ty:ty, $host:ident, $variant:ident) => {
        impl SqlType for $ty {
            fn host_type() -> HostType {
                HostType::$host
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

sql_type!(bool, Bool, Bool);
sql_type!(i16, SmallInt, SmallInt);
sql_type!(i32, Int, Int);
sql_type!(i64, BigInt, BigInt);
sql_type!(f32, Real, Real);
sql_type!(f64, Double, Double);
sql_type!(String, Text, Text);
sql_type!(Vec<u8>, Bytes, Bytes);
sql_type!(NaiveDate, Date, Date);
sql_type!(NaiveTime, Time, Time);
sql_type!(NaiveDateTime, Timestamp, Timestamp);
sql_type!(DateTime<Utc>, TimestampTz, TimestampTz);
sql_type!(Uuid, Uuid, Uuid);
sql_type!(serde_json::Value, Json, Json);
#[cfg(feature = "rust_decimal")]
sql_type!(rust_decimal::Decimal, Decimal, Decimal);

impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for f32 {}
impl Numeric for f64 {}
#[cfg(feature = "rust_decimal")]
impl Numeric for rust_decimal::Decimal {}

impl<T: SqlType> SqlType for Option<T> {
    fn host_type() -> HostType {
        T::host_type()
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
