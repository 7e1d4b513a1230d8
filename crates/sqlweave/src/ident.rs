//! SQL names and dialect-aware identifier quoting.
//!
//! A [`Name`] is a possibly qualified identifier (`schema.table`). Each part is
//! either unquoted or quoted:
//!
//! - Unquoted parts render bare when they match `[A-Za-z_][A-Za-z0-9_$]*` and
//!   are quoted with the dialect's quote characters otherwise.
//! - Quoted parts always render quoted, preserving case.
//!
//! # Example
//! ```ignore
//! use sqlweave::Name;
//!
//! let t = Name::parse("public.users")?;
//! let c = Name::parse(r#""CamelCase"."UserTable""#)?;
//! # Ok::<(), sqlweave::SqlError>(())
//! ```

use crate::config::Dialect;
use crate::error::{SqlError, SqlResult};

/// A part of a SQL name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentPart {
    /// Unquoted identifier, quoted on render only if it is not plain.
    Unquoted(String),
    /// Quoted identifier: always rendered with quotes.
    Quoted(String),
}

impl IdentPart {
    /// The raw identifier text, without quotes.
    pub fn as_str(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }

    fn write(&self, dialect: Dialect, out: &mut String) {
        match self {
            IdentPart::Unquoted(s) => write_identifier(dialect, s, out),
            IdentPart::Quoted(s) => write_quoted(dialect, s, out),
        }
    }
}

/// A possibly qualified SQL name (`table`, `schema.table`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    parts: Vec<IdentPart>,
}

impl Name {
    /// A single unquoted part, taken as-is.
    ///
    /// This is what generated table definitions use; no validation is applied
    /// because non-plain names are quoted on render.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parts: vec![IdentPart::Unquoted(name.into())],
        }
    }

    /// A `schema.name` pair of unquoted parts.
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parts: vec![
                IdentPart::Unquoted(schema.into()),
                IdentPart::Unquoted(name.into()),
            ],
        }
    }

    /// Parse a name string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable"`
    pub fn parse(s: &str) -> SqlResult<Self> {
        if s.is_empty() {
            return Err(SqlError::InvalidIdentifier("identifier cannot be empty".into()));
        }
        if s.contains('\0') {
            return Err(SqlError::InvalidIdentifier(
                "identifier cannot contain NUL character".into(),
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(SqlError::InvalidIdentifier(format!(
                                "trailing '.' in '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(SqlError::InvalidIdentifier(format!(
                            "expected '.' between parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // "" escapes a quote
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(SqlError::InvalidIdentifier(format!(
                                "unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(SqlError::InvalidIdentifier(format!(
                        "empty quoted identifier in '{s}'"
                    )));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(SqlError::InvalidIdentifier(format!(
                        "invalid character '{c}' in '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(SqlError::InvalidIdentifier(format!(
                    "empty identifier segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// The parts of this name.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// The last (unqualified) part.
    pub fn last(&self) -> &str {
        self.parts.last().map(IdentPart::as_str).unwrap_or("")
    }

    /// Render this name for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.write_sql(dialect, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, dialect: Dialect, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            part.write(dialect, out);
        }
    }
}

/// Whether `name` can be rendered without quotes.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

/// Quote an identifier unconditionally with the dialect's quote characters.
pub fn quote_identifier(dialect: Dialect, name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(dialect, name, &mut out);
    out
}

/// Write an identifier, quoting it only if it is not plain.
pub(crate) fn write_identifier(dialect: Dialect, name: &str, out: &mut String) {
    if is_plain_identifier(name) {
        out.push_str(name);
    } else {
        write_quoted(dialect, name, out);
    }
}

fn write_quoted(dialect: Dialect, name: &str, out: &mut String) {
    let (open, close) = dialect.identifier_quotes();
    out.push(open);
    for ch in name.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
}
