//! Result records and row mapping.

use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

use crate::error::{SqlError, SqlResult};
use crate::field::Field;

/// One result row of an executed select.
///
/// Values are read back by the [`Field`] that selected them, by column name,
/// or by position.
#[derive(Debug)]
pub struct Record {
    row: Row,
}

impl Record {
    pub fn new(row: Row) -> Self {
        Self { row }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<&str> {
        self.row.columns().iter().map(|c| c.name()).collect()
    }

    /// The value selected by `field`.
    ///
    /// Columns are matched by the field's column name or alias, exactly first
    /// and then ignoring ASCII case (unquoted identifiers come back folded).
    pub fn get<'a, T: FromSql<'a>>(&'a self, field: &Field<T>) -> SqlResult<T> {
        let name = field
            .name()
            .ok_or_else(|| SqlError::decode("?", "field has no column name"))?;
        self.get_by_name(name)
    }

    /// The value of the column named `name`.
    pub fn get_by_name<'a, T: FromSql<'a>>(&'a self, name: &str) -> SqlResult<T> {
        let index = self
            .index_of(name)
            .ok_or_else(|| SqlError::NotFound(format!("column '{name}' in record")))?;
        self.row
            .try_get(index)
            .map_err(|e| SqlError::decode(name, e.to_string()))
    }

    /// The value at the 0-based column `index`.
    pub fn get_index<'a, T: FromSql<'a>>(&'a self, index: usize) -> SqlResult<T> {
        self.row
            .try_get(index)
            .map_err(|e| SqlError::decode(format!("#{index}"), e.to_string()))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        let columns = self.row.columns();
        columns
            .iter()
            .position(|c| c.name() == name)
            .or_else(|| columns.iter().position(|c| c.name().eq_ignore_ascii_case(name)))
    }

    /// The underlying driver row.
    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn into_row(self) -> Row {
        self.row
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Self {
        Self::new(row)
    }
}

/// Trait for converting a result record into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use sqlweave::{FromRow, Record, SqlResult};
///
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_record(record: &Record) -> SqlResult<Self> {
///         Ok(Self {
///             id: record.get(&users::ID)?,
///             name: record.get(&users::NAME)?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_record(record: &Record) -> SqlResult<Self>;
}
