//! INSERT statements.

use crate::error::{SqlError, SqlResult};
use crate::field::{Expr, Field};
use crate::listener::QueryType;
use crate::query::{
    Mutation, Query, bind_target_column, render_target_column, render_target_table,
};
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::table::Table;
use crate::value::{SqlType, Value};

/// INSERT statement builder: `insert into T (A, B) values (?, ?)`.
///
/// Rendering an insert without any column/value pair fails with
/// [`SqlError::EmptyStatement`].
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table: Table,
    columns: Vec<Expr>,
    values: Vec<Expr>,
}

impl InsertQuery {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Set `field` to a literal value.
    pub fn add_value<T: SqlType>(&mut self, field: &Field<T>, value: impl Into<T>) -> &mut Self {
        self.push(field.expr().clone(), Expr::Literal(value.into().into_value()))
    }

    /// Set `field` to another expression.
    pub fn add_value_field<T>(&mut self, field: &Field<T>, value: &Field<T>) -> &mut Self {
        self.push(field.expr().clone(), value.expr().clone())
    }

    /// Set `field` to NULL.
    pub fn add_null<T>(&mut self, field: &Field<T>) -> &mut Self {
        self.push(field.expr().clone(), Expr::Literal(Value::Null))
    }

    /// Set several untyped column/value pairs.
    pub fn add_values(&mut self, pairs: impl IntoIterator<Item = (Expr, Value)>) -> &mut Self {
        for (column, value) in pairs {
            self.push(column, Expr::Literal(value));
        }
        self
    }

    fn push(&mut self, column: Expr, value: Expr) -> &mut Self {
        self.columns.push(column);
        self.values.push(value);
        self
    }

    /// Number of column/value pairs.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl QueryPart for InsertQuery {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.with_reference(|ctx| {
            ctx.sql("insert into ");
            render_target_table(ctx, &self.table);
            ctx.sql(" (");
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    ctx.sql(", ");
                }
                render_target_column(ctx, column);
            }
            ctx.sql(") values (").visit_list(&self.values, ", ").sql(")");
        })
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| {
            for column in &self.columns {
                bind_target_column(ctx, column)?;
            }
            ctx.visit_list(&self.values)
        })
    }

    fn validate(&self) -> SqlResult<()> {
        if self.is_empty() {
            return Err(SqlError::EmptyStatement("insert"));
        }
        Ok(())
    }
}

impl Query for InsertQuery {
    fn query_type(&self) -> QueryType {
        QueryType::Insert
    }
}

impl Mutation for InsertQuery {}
