//! Per-execution rendering configuration.
//!
//! A [`Configuration`] is a small `Copy` value handed to every render and bind
//! call. There is no process-wide default dialect: whoever renders a statement
//! decides which configuration to use.
//!
//! # Example
//!
//! ```ignore
//! use sqlweave::{Configuration, Dialect};
//!
//! let cfg = Configuration::new(Dialect::Postgres);
//! let debug = cfg.inline();
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SQL dialect tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Dialect-neutral SQL with `?` placeholders.
    #[default]
    Generic,
    /// PostgreSQL (`$1, $2, ...` placeholders).
    Postgres,
    /// MySQL / MariaDB (backtick quoting).
    MySql,
    /// SQLite.
    Sqlite,
    /// H2.
    H2,
    /// Microsoft SQL Server (bracket quoting).
    SqlServer,
    /// Oracle.
    Oracle,
}

impl Dialect {
    /// All known dialects.
    pub const ALL: [Dialect; 7] = [
        Dialect::Generic,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::H2,
        Dialect::SqlServer,
        Dialect::Oracle,
    ];

    /// Stable lowercase name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::H2 => "h2",
            Dialect::SqlServer => "sqlserver",
            Dialect::Oracle => "oracle",
        }
    }

    /// Placeholder text for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> Cow<'static, str> {
        match self {
            Dialect::Postgres => Cow::Owned(format!("${index}")),
            _ => Cow::Borrowed("?"),
        }
    }

    /// Opening and closing identifier quote characters.
    pub fn identifier_quotes(self) -> (char, char) {
        match self {
            Dialect::MySql => ('`', '`'),
            Dialect::SqlServer => ('[', ']'),
            _ => ('"', '"'),
        }
    }

    /// Inline literal for a boolean value.
    pub fn boolean_literal(self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::Sqlite | Dialect::SqlServer | Dialect::Oracle, true) => "1",
            (Dialect::Sqlite | Dialect::SqlServer | Dialect::Oracle, false) => "0",
            (_, true) => "true",
            (_, false) => "false",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SQL dialect '{0}'")]
pub struct ParseDialectError(String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "default" | "sql" => Ok(Dialect::Generic),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "h2" => Ok(Dialect::H2),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            _ => Err(ParseDialectError(s.to_string())),
        }
    }
}

/// Immutable rendering/binding context.
///
/// By default the generic dialect is used in placeholder mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Target dialect.
    pub dialect: Dialect,
    /// Render literal values inline instead of emitting placeholders.
    pub inline_parameters: bool,
}

impl Configuration {
    /// Create a placeholder-mode configuration for a dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            inline_parameters: false,
        }
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set whether literal values are inlined.
    pub fn with_inline_parameters(mut self, inline: bool) -> Self {
        self.inline_parameters = inline;
        self
    }

    /// Same configuration, rendering literals inline.
    pub fn inline(self) -> Self {
        self.with_inline_parameters(true)
    }

    /// Same configuration, rendering placeholders.
    pub fn prepared(self) -> Self {
        self.with_inline_parameters(false)
    }
}
