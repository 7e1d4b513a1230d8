//! Dialect lookups: limit clauses, array conventions and scalar type resolution.
//!
//! Identifier quoting and placeholder tokens live on [`Dialect`] itself; this
//! module holds the table-driven lookups consumed by code generators and by
//! the statement renderer.

use std::fmt::Write;

use crate::config::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::value::HostType;

pub use crate::ident::quote_identifier;

/// How a dialect spells array column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayConvention {
    /// `integer array` / `array` (H2).
    NameBased,
    /// `integer[]` (PostgreSQL).
    SuffixBased,
}

/// Array type convention for a dialect.
pub fn array_type_convention(dialect: Dialect) -> SqlResult<ArrayConvention> {
    match dialect {
        Dialect::Postgres => Ok(ArrayConvention::SuffixBased),
        Dialect::H2 => Ok(ArrayConvention::NameBased),
        _ => Err(SqlError::unsupported(dialect, "array types")),
    }
}

/// Render the row-limiting clause (without a leading space).
///
/// Values are rendered inline; they are never bound.
pub fn limit_clause(dialect: Dialect, limit: u64, offset: Option<u64>) -> String {
    let mut out = String::new();
    match dialect {
        Dialect::SqlServer | Dialect::Oracle => {
            let _ = write!(
                out,
                "offset {} rows fetch next {limit} rows only",
                offset.unwrap_or(0)
            );
        }
        _ => {
            let _ = write!(out, "limit {limit}");
            if let Some(offset) = offset {
                let _ = write!(out, " offset {offset}");
            }
        }
    }
    out
}

/// Lowercase, strip `(...)` typmods and compress whitespace.
pub fn normalize_type_name(type_name: &str) -> String {
    let mut s = type_name.trim().to_lowercase();

    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        "timestamp without time zone" => "timestamp".to_string(),
        "time without time zone" => "time".to_string(),
        _ => s,
    }
}

/// Map a database type name to a host type.
///
/// `precision` and `scale` only matter for exact numerics: a zero-scale
/// `numeric`/`decimal`/`number` narrows to the smallest integer type that holds
/// `precision` digits. Types the dialect has no entry for yield
/// [`SqlError::UnsupportedDialect`].
pub fn resolve_type(
    dialect: Dialect,
    type_name: &str,
    precision: u32,
    scale: u32,
) -> SqlResult<HostType> {
    let normalized = normalize_type_name(type_name);

    match (dialect, array_type_convention(dialect)) {
        (_, Ok(ArrayConvention::SuffixBased)) => {
            if let Some(base) = normalized.strip_suffix("[]") {
                let inner = resolve_type(dialect, base, precision, scale)?;
                return Ok(HostType::Array(Box::new(inner)));
            }
        }
        (_, Ok(ArrayConvention::NameBased)) => {
            if normalized == "array" {
                return Ok(HostType::Array(Box::new(HostType::Text)));
            }
            if let Some(base) = normalized.strip_suffix(" array") {
                let inner = resolve_type(dialect, base, precision, scale)?;
                return Ok(HostType::Array(Box::new(inner)));
            }
        }
        (Dialect::Generic, _) => {
            return Err(SqlError::unsupported(dialect, format!("type '{type_name}'")));
        }
        _ => {}
    }

    let resolved = match dialect {
        Dialect::Postgres => postgres_type(&normalized),
        Dialect::MySql => mysql_type(&normalized, precision),
        Dialect::Sqlite => sqlite_type(&normalized),
        Dialect::H2 => h2_type(&normalized),
        Dialect::SqlServer => sqlserver_type(&normalized),
        Dialect::Oracle => oracle_type(&normalized, precision),
        Dialect::Generic => None,
    };

    match resolved {
        Some(HostType::Decimal) if scale == 0 => Ok(exact_integer(precision)),
        Some(t) => Ok(t),
        None => Err(SqlError::unsupported(dialect, format!("type '{type_name}'"))),
    }
}

/// Like [`resolve_type`], falling back to text for unmapped types.
pub fn resolve_type_or_text(
    dialect: Dialect,
    type_name: &str,
    precision: u32,
    scale: u32,
) -> HostType {
    match resolve_type(dialect, type_name, precision, scale) {
        Ok(t) => t,
        Err(err) => {
            tracing::warn!(
                target: "sqlweave.dialect",
                %dialect,
                type_name,
                error = %err,
                "no type mapping, falling back to text"
            );
            HostType::Text
        }
    }
}

fn exact_integer(precision: u32) -> HostType {
    match precision {
        0 => HostType::Decimal,
        1..=4 => HostType::SmallInt,
        5..=9 => HostType::Int,
        10..=18 => HostType::BigInt,
        _ => HostType::Decimal,
    }
}

fn postgres_type(name: &str) -> Option<HostType> {
    Some(match name {
        "bool" | "boolean" => HostType::Bool,
        "int2" | "smallint" | "smallserial" => HostType::SmallInt,
        "int4" | "integer" | "int" | "serial" => HostType::Int,
        "int8" | "bigint" | "bigserial" => HostType::BigInt,
        "float4" | "real" => HostType::Real,
        "float8" | "double precision" => HostType::Double,
        "numeric" | "decimal" => HostType::Decimal,
        "text" | "varchar" | "char" | "character" | "bpchar" | "name" | "citext" => {
            HostType::Text
        }
        "uuid" => HostType::Uuid,
        "json" | "jsonb" => HostType::Json,
        "timestamptz" => HostType::TimestampTz,
        "timestamp" => HostType::Timestamp,
        "date" => HostType::Date,
        "time" => HostType::Time,
        "bytea" => HostType::Bytes,
        _ => return None,
    })
}

fn mysql_type(name: &str, precision: u32) -> Option<HostType> {
    Some(match name {
        "bool" | "boolean" => HostType::Bool,
        "bit" if precision <= 1 => HostType::Bool,
        "tinyint" if precision == 1 => HostType::Bool,
        "tinyint" | "smallint" => HostType::SmallInt,
        "mediumint" | "int" | "integer" => HostType::Int,
        "bigint" => HostType::BigInt,
        "float" => HostType::Real,
        "double" | "double precision" | "real" => HostType::Double,
        "decimal" | "numeric" | "dec" => HostType::Decimal,
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set" => {
            HostType::Text
        }
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit" => {
            HostType::Bytes
        }
        "date" => HostType::Date,
        "time" => HostType::Time,
        "datetime" => HostType::Timestamp,
        "timestamp" => HostType::TimestampTz,
        "json" => HostType::Json,
        _ => return None,
    })
}

fn sqlite_type(name: &str) -> Option<HostType> {
    Some(match name {
        "boolean" | "bool" => HostType::Bool,
        "integer" | "int" | "bigint" => HostType::BigInt,
        "smallint" => HostType::SmallInt,
        "real" | "double" | "float" => HostType::Double,
        "numeric" | "decimal" => HostType::Decimal,
        "text" | "varchar" | "char" | "clob" => HostType::Text,
        "blob" => HostType::Bytes,
        "date" => HostType::Date,
        "datetime" | "timestamp" => HostType::Timestamp,
        _ => return None,
    })
}

fn h2_type(name: &str) -> Option<HostType> {
    Some(match name {
        "boolean" | "bool" | "bit" => HostType::Bool,
        "tinyint" | "smallint" => HostType::SmallInt,
        "int" | "integer" => HostType::Int,
        "bigint" => HostType::BigInt,
        "real" => HostType::Real,
        "double" | "double precision" | "float" => HostType::Double,
        "decimal" | "numeric" | "number" => HostType::Decimal,
        "varchar" | "char" | "character" | "varchar_ignorecase" | "clob" | "enum" => {
            HostType::Text
        }
        "binary" | "varbinary" | "binary varying" | "blob" => HostType::Bytes,
        "date" => HostType::Date,
        "time" => HostType::Time,
        "timestamp" => HostType::Timestamp,
        "timestamptz" => HostType::TimestampTz,
        "uuid" => HostType::Uuid,
        "json" => HostType::Json,
        _ => return None,
    })
}

fn sqlserver_type(name: &str) -> Option<HostType> {
    Some(match name {
        "bit" => HostType::Bool,
        "tinyint" | "smallint" => HostType::SmallInt,
        "int" => HostType::Int,
        "bigint" => HostType::BigInt,
        "real" => HostType::Real,
        "float" => HostType::Double,
        "decimal" | "numeric" | "money" | "smallmoney" => HostType::Decimal,
        "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "xml" => HostType::Text,
        "binary" | "varbinary" | "image" => HostType::Bytes,
        "date" => HostType::Date,
        "time" => HostType::Time,
        "datetime" | "datetime2" | "smalldatetime" => HostType::Timestamp,
        "datetimeoffset" => HostType::TimestampTz,
        "uniqueidentifier" => HostType::Uuid,
        _ => return None,
    })
}

fn oracle_type(name: &str, precision: u32) -> Option<HostType> {
    Some(match name {
        // Oracle has no boolean column type; number(1) is the common idiom.
        "number" if precision == 1 => HostType::Bool,
        "number" | "decimal" | "numeric" => HostType::Decimal,
        "integer" | "int" | "smallint" => HostType::Decimal,
        "binary_float" => HostType::Real,
        "binary_double" | "float" => HostType::Double,
        "char" | "nchar" | "varchar" | "varchar2" | "nvarchar2" | "clob" | "nclob" | "long" => {
            HostType::Text
        }
        "raw" | "long raw" | "blob" => HostType::Bytes,
        "date" => HostType::Timestamp,
        "timestamp" => HostType::Timestamp,
        "timestamptz" | "timestamp with local time zone" => HostType::TimestampTz,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_typmods() {
        assert_eq!(normalize_type_name("character varying(255)"), "varchar");
        assert_eq!(normalize_type_name("timestamp(3) with time zone"), "timestamptz");
        assert_eq!(normalize_type_name("  NUMERIC(10, 2) "), "numeric");
    }

    #[test]
    fn postgres_builtin_types() {
        let pg = Dialect::Postgres;
        assert_eq!(resolve_type(pg, "integer", 0, 0).unwrap(), HostType::Int);
        assert_eq!(resolve_type(pg, "jsonb", 0, 0).unwrap(), HostType::Json);
        assert_eq!(
            resolve_type(pg, "uuid[]", 0, 0).unwrap(),
            HostType::Array(Box::new(HostType::Uuid))
        );
        assert_eq!(
            resolve_type(pg, "timestamp with time zone", 0, 0).unwrap(),
            HostType::TimestampTz
        );
    }

    #[test]
    fn zero_scale_numerics_narrow_to_integers() {
        let pg = Dialect::Postgres;
        assert_eq!(resolve_type(pg, "numeric", 4, 0).unwrap(), HostType::SmallInt);
        assert_eq!(resolve_type(pg, "numeric", 9, 0).unwrap(), HostType::Int);
        assert_eq!(resolve_type(pg, "numeric", 18, 0).unwrap(), HostType::BigInt);
        assert_eq!(resolve_type(pg, "numeric", 30, 0).unwrap(), HostType::Decimal);
        assert_eq!(resolve_type(pg, "numeric", 10, 2).unwrap(), HostType::Decimal);
        assert_eq!(resolve_type(pg, "numeric", 0, 0).unwrap(), HostType::Decimal);
        assert_eq!(
            resolve_type(Dialect::Oracle, "NUMBER", 10, 0).unwrap(),
            HostType::BigInt
        );
    }

    #[test]
    fn dialect_specific_names() {
        assert_eq!(resolve_type(Dialect::MySql, "tinyint", 1, 0).unwrap(), HostType::Bool);
        assert_eq!(resolve_type(Dialect::MySql, "datetime", 0, 0).unwrap(), HostType::Timestamp);
        assert_eq!(
            resolve_type(Dialect::SqlServer, "uniqueidentifier", 0, 0).unwrap(),
            HostType::Uuid
        );
        assert_eq!(resolve_type(Dialect::Sqlite, "INTEGER", 0, 0).unwrap(), HostType::BigInt);
        assert_eq!(
            resolve_type(Dialect::H2, "INTEGER ARRAY", 0, 0).unwrap(),
            HostType::Array(Box::new(HostType::Int))
        );
    }

    #[test]
    fn unknown_types_are_unsupported() {
        let err = resolve_type(Dialect::Postgres, "tsvector", 0, 0).unwrap_err();
        assert!(err.is_unsupported_dialect());
        assert!(resolve_type(Dialect::Generic, "integer", 0, 0).is_err());
        assert!(resolve_type(Dialect::MySql, "int[]", 0, 0).is_err());
        assert_eq!(
            resolve_type_or_text(Dialect::Postgres, "tsvector", 0, 0),
            HostType::Text
        );
    }

    #[test]
    fn array_conventions() {
        assert_eq!(
            array_type_convention(Dialect::Postgres).unwrap(),
            ArrayConvention::SuffixBased
        );
        assert_eq!(array_type_convention(Dialect::H2).unwrap(), ArrayConvention::NameBased);
        assert!(array_type_convention(Dialect::MySql).unwrap_err().is_unsupported_dialect());
    }

    #[test]
    fn limit_clauses() {
        assert_eq!(limit_clause(Dialect::Postgres, 10, None), "limit 10");
        assert_eq!(limit_clause(Dialect::MySql, 10, Some(20)), "limit 10 offset 20");
        assert_eq!(
            limit_clause(Dialect::SqlServer, 10, None),
            "offset 0 rows fetch next 10 rows only"
        );
        assert_eq!(
            limit_clause(Dialect::Oracle, 5, Some(15)),
            "offset 15 rows fetch next 5 rows only"
        );
    }
}
