//! Aggregate and scalar function constructors.
//!
//! Most have a method form on [`Field`]; the free functions here also accept
//! expressions that are not fields of a table (`count()`, `val(..)`).

use crate::field::{Expr, Field, function_expr};
use crate::value::{Numeric, SqlType};

/// `count(*)`.
pub fn count() -> Field<i64> {
    Field::from_expr(function_expr("count", false, vec![Expr::Asterisk]))
}

/// `count(distinct field)`.
pub fn count_distinct<T>(field: &Field<T>) -> Field<i64> {
    field.count_distinct()
}

pub fn sum<T: Numeric>(field: &Field<T>) -> Field<T> {
    field.sum()
}

pub fn avg<T: Numeric>(field: &Field<T>) -> Field<f64> {
    field.avg()
}

pub fn min<T>(field: &Field<T>) -> Field<T> {
    field.min()
}

pub fn max<T>(field: &Field<T>) -> Field<T> {
    field.max()
}

pub fn upper(field: &Field<String>) -> Field<String> {
    field.upper()
}

pub fn lower(field: &Field<String>) -> Field<String> {
    field.lower()
}

pub fn trim(field: &Field<String>) -> Field<String> {
    field.trim()
}

pub fn length(field: &Field<String>) -> Field<i32> {
    field.length()
}

/// `concat(a, b, ...)`.
pub fn concat<'a, I>(fields: I) -> Field<String>
where
    I: IntoIterator<Item = &'a Field<String>>,
{
    let args = fields.into_iter().map(Expr::from).collect();
    Field::from_expr(function_expr("concat", false, args))
}

/// `coalesce(field, fallback)`.
pub fn coalesce<T: SqlType>(field: &Field<T>, fallback: impl Into<T>) -> Field<T> {
    Field::from_expr(function_expr(
        "coalesce",
        false,
        vec![field.into(), Expr::Literal(fallback.into().into_value())],
    ))
}

pub fn current_date() -> Field<chrono::NaiveDate> {
    Field::from_expr(Expr::Keyword("current_date"))
}

pub fn current_timestamp() -> Field<chrono::DateTime<chrono::Utc>> {
    Field::from_expr(Expr::Keyword("current_timestamp"))
}

/// A literal value as a field: inlined or bound like any other literal.
pub fn val<T: SqlType>(value: T) -> Field<T> {
    Field::from_expr(Expr::Literal(value.into_value()))
}

/// A call to an arbitrary function: `name(args...)`.
pub fn function<T>(name: &'static str, args: Vec<Expr>) -> Field<T> {
    Field::from_expr(function_expr(name, false, args))
}
