//! Set operations over selects: UNION, UNION ALL, INTERSECT, EXCEPT.

use crate::client::GenericClient;
use crate::condition::Condition;
use crate::error::SqlResult;
use crate::execute::Executor;
use crate::field::{Expr, Field, SortField};
use crate::listener::QueryType;
use crate::query::{Query, Select, SelectQuery};
use crate::record::{FromRow, Record};
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::table::{JoinKind, Table};

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            SetOperator::Union => "union",
            SetOperator::UnionAll => "union all",
            SetOperator::Intersect => "intersect",
            SetOperator::Except => "except",
        }
    }
}

/// `((left) op (right))`, used as the FROM source of the outer select.
#[derive(Debug, Clone)]
struct SetOperation {
    operator: SetOperator,
    left: Box<Select>,
    right: Box<Select>,
}

impl QueryPart for SetOperation {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.sql("(")
            .visit_parenthesized(self.left.as_ref())
            .sql(" ")
            .sql(self.operator.keyword())
            .sql(" ")
            .visit_parenthesized(self.right.as_ref())
            .sql(")");
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.visit(self.left.as_ref())?;
        ctx.visit(self.right.as_ref())
    }
}

/// A set operation over two selects, with its own outer clauses.
///
/// Clauses added to a combined query apply to the combined result, the same
/// way they apply to the FROM list of a [`SelectQuery`]:
///
/// ```ignore
/// let mut q = a.union(b);
/// q.add_order_by(&id);
/// // select * from ((select ...) union (select ...)) order by T.ID
/// ```
#[derive(Debug, Clone)]
pub struct CombinedQuery {
    set: SetOperation,
    outer: SelectQuery,
}

impl CombinedQuery {
    pub fn new(operator: SetOperator, left: impl Into<Select>, right: impl Into<Select>) -> Self {
        Self {
            set: SetOperation {
                operator,
                left: Box::new(left.into()),
                right: Box::new(right.into()),
            },
            outer: SelectQuery::new(),
        }
    }

    pub fn operator(&self) -> SetOperator {
        self.set.operator
    }

    pub fn add_select(&mut self, field: impl Into<Expr>) -> &mut Self {
        self.outer.add_select(field);
        self
    }

    pub fn add_join(&mut self, table: &Table, on: Condition) -> &mut Self {
        self.outer.add_join(table, on);
        self
    }

    pub fn add_join_with(
        &mut self,
        kind: JoinKind,
        table: &Table,
        on: Option<Condition>,
    ) -> &mut Self {
        self.outer.add_join_with(kind, table, on);
        self
    }

    pub fn add_conditions(&mut self, condition: Condition) -> &mut Self {
        self.outer.add_conditions(condition);
        self
    }

    pub fn add_group_by(&mut self, field: impl Into<Expr>) -> &mut Self {
        self.outer.add_group_by(field);
        self
    }

    pub fn add_having(&mut self, condition: Condition) -> &mut Self {
        self.outer.add_having(condition);
        self
    }

    pub fn set_distinct(&mut self, distinct: bool) -> &mut Self {
        self.outer.set_distinct(distinct);
        self
    }

    pub fn add_order_by(&mut self, field: impl Into<SortField>) -> &mut Self {
        self.outer.add_order_by(field);
        self
    }

    pub fn add_limit(&mut self, limit: u64) -> &mut Self {
        self.outer.add_limit(limit);
        self
    }

    pub fn add_limit_offset(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.outer.add_limit_offset(limit, offset);
        self
    }

    /// Outer select list width, else the left operand's.
    pub fn column_count(&self) -> Option<usize> {
        self.outer
            .column_count()
            .or_else(|| self.set.left.column_count())
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

    pub fn as_table(self, alias: impl Into<String>) -> Table {
        Table::derived(self, alias)
    }

    pub fn as_exists_condition(self) -> Condition {
        Condition::exists(self)
    }

    pub fn as_not_exists_condition(self) -> Condition {
        Condition::not_exists(self)
    }

    /// Run the query and return its records.
    pub async fn fetch<C: GenericClient>(&self, executor: &Executor<C>) -> SqlResult<Vec<Record>> {
        executor.fetch(self).await
    }

    pub async fn fetch_into<T: FromRow, C: GenericClient>(
        &self,
        executor: &Executor<C>,
    ) -> SqlResult<Vec<T>> {
        executor.fetch_into(self).await
    }
}

impl QueryPart for CombinedQuery {
    fn render(&self, ctx: &mut RenderContext) {
        self.outer.render_with_source(ctx, Some(&self.set))
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        self.outer.bind_with_source(ctx, Some(&self.set))
    }
}

impl Query for CombinedQuery {
    fn query_type(&self) -> QueryType {
        QueryType::Select
    }
}
