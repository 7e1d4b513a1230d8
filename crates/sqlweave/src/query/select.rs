//! SELECT statements.

use std::sync::Arc;

use crate::client::GenericClient;
use crate::condition::{Condition, ConditionProvider};
use crate::config::Dialect;
use crate::dialect::limit_clause;
use crate::error::SqlResult;
use crate::execute::Executor;
use crate::field::{Expr, Field, SortField};
use crate::listener::QueryType;
use crate::query::{CombinedQuery, Query, Select, SetOperator};
use crate::record::{FromRow, Record};
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::table::{JoinKind, Table, bind_join, render_join};

/// `limit n [offset m]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub limit: u64,
    pub offset: Option<u64>,
}

/// A join appended to the FROM clause with `add_join`.
#[derive(Debug, Clone)]
pub(crate) struct JoinClause {
    kind: JoinKind,
    table: Table,
    on: Option<Condition>,
}

/// SELECT statement builder.
///
/// # Example
/// ```ignore
/// let t = Table::new("T");
/// let id: Field<i32> = t.field("ID");
///
/// let mut q = SelectQuery::new();
/// q.add_from(&t).add_conditions(id.eq(1)).add_order_by(id.desc());
/// // select * from T where T.ID = ? order by T.ID desc
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    distinct: bool,
    select: Vec<Expr>,
    from: Vec<Table>,
    joins: Vec<JoinClause>,
    conditions: ConditionProvider,
    group_by: Vec<Expr>,
    having: ConditionProvider,
    order_by: Vec<SortField>,
    limit: Option<Limit>,
    result: Option<Arc<[Record]>>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one expression to the select list.
    pub fn add_select(&mut self, field: impl Into<Expr>) -> &mut Self {
        self.select.push(field.into());
        self
    }

    /// Append several expressions to the select list.
    pub fn add_select_all(&mut self, fields: impl IntoIterator<Item = Expr>) -> &mut Self {
        self.select.extend(fields);
        self
    }

    pub fn add_from(&mut self, table: &Table) -> &mut Self {
        self.from.push(table.clone());
        self
    }

    /// `join table on condition` after the FROM list.
    pub fn add_join(&mut self, table: &Table, on: Condition) -> &mut Self {
        self.add_join_with(JoinKind::Inner, table, Some(on))
    }

    pub fn add_join_with(
        &mut self,
        kind: JoinKind,
        table: &Table,
        on: Option<Condition>,
    ) -> &mut Self {
        self.joins.push(JoinClause {
            kind,
            table: table.clone(),
            on,
        });
        self
    }

    /// Append to the WHERE clause (implicitly `and`-ed).
    pub fn add_conditions(&mut self, condition: Condition) -> &mut Self {
        self.conditions.add(condition);
        self
    }

    pub fn add_group_by(&mut self, field: impl Into<Expr>) -> &mut Self {
        self.group_by.push(field.into());
        self
    }

    /// Append to the HAVING clause (implicitly `and`-ed).
    pub fn add_having(&mut self, condition: Condition) -> &mut Self {
        self.having.add(condition);
        self
    }

    pub fn add_order_by(&mut self, field: impl Into<SortField>) -> &mut Self {
        self.order_by.push(field.into());
        self
    }

    pub fn add_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(Limit {
            limit,
            offset: None,
        });
        self
    }

    pub fn add_limit_offset(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.limit = Some(Limit {
            limit,
            offset: Some(offset),
        });
        self
    }

    pub fn set_distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Number of selected columns, `None` for `*`.
    pub fn column_count(&self) -> Option<usize> {
        (!self.select.is_empty()).then_some(self.select.len())
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

    /// Embed as a scalar subquery; see [`Select::as_field`].
    pub fn as_field<T>(self) -> SqlResult<Field<T>> {
        Select::from(self).as_field()
    }

    /// Embed as a derived table.
    pub fn as_table(self, alias: impl Into<String>) -> Table {
        Table::derived(self, alias)
    }

    pub fn as_exists_condition(self) -> Condition {
        Condition::exists(self)
    }

    pub fn as_not_exists_condition(self) -> Condition {
        Condition::not_exists(self)
    }

    /// Records captured by the last [`execute`](Self::execute).
    pub fn result(&self) -> Option<&[Record]> {
        self.result.as_deref()
    }

    /// Run the query and keep its records; returns the record count.
    pub async fn execute<C: GenericClient>(&mut self, executor: &Executor<C>) -> SqlResult<usize> {
        let records = executor.fetch(&*self).await?;
        let count = records.len();
        self.result = Some(records.into());
        Ok(count)
    }

    /// Run the query and return its records.
    pub async fn fetch<C: GenericClient>(&self, executor: &Executor<C>) -> SqlResult<Vec<Record>> {
        executor.fetch(self).await
    }

    /// Run the query and map every record to `T`.
    pub async fn fetch_into<T: FromRow, C: GenericClient>(
        &self,
        executor: &Executor<C>,
    ) -> SqlResult<Vec<T>> {
        executor.fetch_into(self).await
    }

    /// Render, with `source` standing in for the FROM list when present.
    pub(crate) fn render_with_source(&self, ctx: &mut RenderContext, source: Option<&dyn QueryPart>) {
        ctx.with_reference(|ctx| {
            ctx.sql("select ");
            if self.distinct {
                ctx.sql("distinct ");
            }
            if self.select.is_empty() {
                ctx.sql("*");
            } else {
                ctx.with_declare_fields(true, |ctx| {
                    ctx.visit_list(&self.select, ", ");
                });
            }

            ctx.with_declare_tables(true, |ctx| {
                if let Some(source) = source {
                    ctx.sql(" from ").visit(source);
                } else if !self.from.is_empty() {
                    ctx.sql(" from ").visit_list(&self.from, ", ");
                }
                for join in &self.joins {
                    render_join(ctx, join.kind, &join.table, join.on.as_ref());
                }
            });

            self.conditions.render_clause(ctx, "where");

            if !self.group_by.is_empty() {
                ctx.sql(" group by ").visit_list(&self.group_by, ", ");
            }

            self.having.render_clause(ctx, "having");

            if !self.order_by.is_empty() {
                ctx.sql(" order by ").visit_list(&self.order_by, ", ");
            }

            if let Some(limit) = self.limit {
                // OFFSET ... FETCH is only valid after an ORDER BY on SQL Server.
                if self.order_by.is_empty() && ctx.dialect() == Dialect::SqlServer {
                    ctx.sql(" order by (select null)");
                }
                let clause = limit_clause(ctx.dialect(), limit.limit, limit.offset);
                ctx.sql(" ").sql(&clause);
            }
        })
    }

    pub(crate) fn bind_with_source(
        &self,
        ctx: &mut BindContext<'_>,
        source: Option<&dyn QueryPart>,
    ) -> SqlResult<()> {
        ctx.with_reference(|ctx| {
            if !self.select.is_empty() {
                ctx.with_declare_fields(true, |ctx| ctx.visit_list(&self.select))?;
            }

            ctx.with_declare_tables(true, |ctx| -> SqlResult<()> {
                if let Some(source) = source {
                    ctx.visit(source)?;
                } else {
                    ctx.visit_list(&self.from)?;
                }
                for join in &self.joins {
                    bind_join(ctx, &join.table, join.on.as_ref())?;
                }
                Ok(())
            })?;

            self.conditions.bind_clause(ctx)?;
            ctx.visit_list(&self.group_by)?;
            self.having.bind_clause(ctx)?;
            ctx.visit_list(&self.order_by)
        })
    }
}

impl QueryPart for SelectQuery {
    fn render(&self, ctx: &mut RenderContext) {
        self.render_with_source(ctx, None)
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        self.bind_with_source(ctx, None)
    }
}

impl Query for SelectQuery {
    fn query_type(&self) -> QueryType {
        QueryType::Select
    }
}
