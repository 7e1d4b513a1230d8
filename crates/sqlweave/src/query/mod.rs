//! Statement builders.
//!
//! Builders are mutable accumulators: every `add_*` call appends and returns
//! `&mut Self` for chaining. Rendering and binding take `&self`.
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let t = Table::new("T");
//! let id: Field<i32> = t.field("ID");
//! let name: Field<String> = t.field("NAME");
//!
//! // SELECT
//! let mut q = select_from(&t);
//! q.add_conditions(id.eq(1).or(name.like("A%")));
//! let sql = q.to_sql(&Configuration::default())?;
//!
//! // INSERT
//! let mut ins = insert_into(&t);
//! ins.add_value(&id, 10).add_value(&name, "ABC");
//! ins.execute(&executor).await?;
//! ```

mod combined;
mod delete;
mod insert;
mod select;
mod update;


pub use combined::{CombinedQuery, SetOperator};
pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use select::{Limit, SelectQuery};
pub use update::UpdateQuery;

use crate::client::GenericClient;
use crate::condition::Condition;
use crate::config::Configuration;
use crate::error::{SqlError, SqlResult};
use crate::execute::Executor;
use crate::field::{Expr, Field, SortField};
use crate::listener::QueryType;
use crate::render::{self, BindContext, BindSink, QueryPart, RenderContext};
use crate::table::{JoinKind, Table};

/// A top-level, executable statement.
pub trait Query: QueryPart + Sync {
    /// Statement kind, reported to execute listeners.
    fn query_type(&self) -> QueryType;

    /// Validate, then render.
    fn to_sql(&self, config: &Configuration) -> SqlResult<String> {
        render::render(self, config)
    }

    /// Validate, then bind into `sink` from the 1-based `start` index.
    ///
    /// Returns the next free index.
    fn bind_values(
        &self,
        config: &Configuration,
        sink: &mut dyn BindSink,
        start: usize,
    ) -> SqlResult<usize> {
        render::bind(self, config, sink, start)
    }
}

/// INSERT/UPDATE/DELETE statements.
pub trait Mutation: Query {
    /// Execute and return the affected row count.
    fn execute<C: GenericClient>(
        &self,
        executor: &Executor<C>,
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send
    where
        Self: Sized,
    {
        executor.execute(self)
    }
}

/// A select-like statement: simple or combined.
///
/// This is what subquery positions hold: scalar subqueries, `in (select ...)`,
/// `exists (...)` and derived tables.
#[derive(Debug, Clone)]
pub enum Select {
    Simple(SelectQuery),
    Combined(CombinedQuery),
}

impl Select {
    /// Number of selected columns, `None` when it is `*`.
    pub fn column_count(&self) -> Option<usize> {
        match self {
            Select::Simple(q) => q.column_count(),
            Select::Combined(q) => q.column_count(),
        }
    }

    pub fn add_select(&mut self, field: impl Into<Expr>) -> &mut Self {
        match self {
            Select::Simple(q) => {
                q.add_select(field);
            }
            Select::Combined(q) => {
                q.add_select(field);
            }
        }
        self
    }

    pub fn add_join(&mut self, table: &Table, on: Condition) -> &mut Self {
        self.add_join_with(JoinKind::Inner, table, Some(on))
    }

    pub fn add_join_with(
        &mut self,
        kind: JoinKind,
        table: &Table,
        on: Option<Condition>,
    ) -> &mut Self {
        match self {
            Select::Simple(q) => {
                q.add_join_with(kind, table, on);
            }
            Select::Combined(q) => {
                q.add_join_with(kind, table, on);
            }
        }
        self
    }

    pub fn add_conditions(&mut self, condition: Condition) -> &mut Self {
        match self {
            Select::Simple(q) => {
                q.add_conditions(condition);
            }
            Select::Combined(q) => {
                q.add_conditions(condition);
            }
        }
        self
    }

    pub fn add_order_by(&mut self, field: impl Into<SortField>) -> &mut Self {
        match self {
            Select::Simple(q) => {
                q.add_order_by(field);
            }
            Select::Combined(q) => {
                q.add_order_by(field);
            }
        }
        self
    }

    pub fn add_limit(&mut self, limit: u64) -> &mut Self {
        match self {
            Select::Simple(q) => {
                q.add_limit(limit);
            }
            Select::Combined(q) => {
                q.add_limit(limit);
            }
        }
        self
    }

    pub fn union(self, other: impl Into<Select>) -> CombinedQuery {
        CombinedQuery::new(SetOperator::Union, self, other)
    }

    pub fn union_all(self, other: impl Into<Select>) -> CombinedQuery {
        CombinedQuery::new(SetOperator::UnionAll, self, other)
    }

    pub fn intersect(self, other: impl Into<Select>) -> CombinedQuery {
        CombinedQuery::new(SetOperator::Intersect, self, other)
    }

    pub fn except(self, other: impl Into<Select>) -> CombinedQuery {
        CombinedQuery::new(SetOperator::Except, self, other)
    }

    /// Embed as a scalar subquery: `(select ...)`.
    ///
    /// Fails with [`SqlError::SubqueryColumns`] when the select list is known
    /// and is not exactly one column. A `*` list is accepted as-is.
    pub fn as_field<T>(self) -> SqlResult<Field<T>> {
        match self.column_count() {
            Some(actual) if actual != 1 => Err(SqlError::SubqueryColumns {
                expected: 1,
                actual,
            }),
            _ => Ok(Field::from_expr(Expr::Subquery(Box::new(self)))),
        }
    }

    /// Embed as a derived table: `(select ...) alias`.
    pub fn as_table(self, alias: impl Into<String>) -> Table {
        Table::derived(self, alias)
    }

    pub fn as_exists_condition(self) -> Condition {
        Condition::exists(self)
    }

    pub fn as_not_exists_condition(self) -> Condition {
        Condition::not_exists(self)
    }
}

impl From<SelectQuery> for Select {
    fn from(q: SelectQuery) -> Self {
        Select::Simple(q)
    }
}

impl From<CombinedQuery> for Select {
    fn from(q: CombinedQuery) -> Self {
        Select::Combined(q)
    }
}

impl QueryPart for Select {
    fn render(&self, ctx: &mut RenderContext) {
        match self {
            Select::Simple(q) => q.render(ctx),
            Select::Combined(q) => q.render(ctx),
        }
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        match self {
            Select::Simple(q) => q.bind(ctx),
            Select::Combined(q) => q.bind(ctx),
        }
    }

    fn validate(&self) -> SqlResult<()> {
        match self {
            Select::Simple(q) => q.validate(),
            Select::Combined(q) => q.validate(),
        }
    }
}

impl Query for Select {
    fn query_type(&self) -> QueryType {
        QueryType::Select
    }
}

/// `select <fields>` with no FROM yet.
pub fn select<I>(fields: I) -> SelectQuery
where
    I: IntoIterator<Item = Expr>,
{
    let mut q = SelectQuery::new();
    q.add_select_all(fields);
    q
}

/// `select * from table`.
pub fn select_from(table: &Table) -> SelectQuery {
    let mut q = SelectQuery::new();
    q.add_from(table);
    q
}

pub fn insert_into(table: &Table) -> InsertQuery {
    InsertQuery::new(table)
}

pub fn update(table: &Table) -> UpdateQuery {
    UpdateQuery::new(table)
}

pub fn delete_from(table: &Table) -> DeleteQuery {
    DeleteQuery::new(table)
}

/// Column name of a target field, without its table qualifier.
pub(crate) fn render_target_column(ctx: &mut RenderContext, expr: &Expr) {
    match expr {
        Expr::Column { name, .. } => {
            ctx.identifier(name);
        }
        Expr::Aliased { inner, .. } => render_target_column(ctx, inner),
        other => {
            ctx.with_reference(|ctx| {
                ctx.visit(other);
            });
        }
    }
}

pub(crate) fn bind_target_column(ctx: &mut BindContext<'_>, expr: &Expr) -> SqlResult<()> {
    match expr {
        Expr::Column { .. } => Ok(()),
        Expr::Aliased { inner, .. } => bind_target_column(ctx, inner),
        other => ctx.with_reference(|ctx| ctx.visit(other)),
    }
}

/// The target table of a mutation, by its base name when it has one.
pub(crate) fn render_target_table(ctx: &mut RenderContext, table: &Table) {
    match table.name() {
        Some(name) => {
            ctx.name(name);
        }
        None => {
            ctx.visit(table);
        }
    }
}

/// Alias of an aliased base table used as a mutation target.
pub(crate) fn target_alias(table: &Table) -> Option<&str> {
    table.name().and(table.alias_name())
}

/// `T` or `T t1`: the target of an UPDATE or DELETE, declaring its alias so
/// that alias-qualified columns in SET and WHERE resolve.
pub(crate) fn render_target_declaration(ctx: &mut RenderContext, table: &Table) {
    render_target_table(ctx, table);
    if let Some(alias) = target_alias(table) {
        ctx.sql(" ").identifier(alias);
    }
}
