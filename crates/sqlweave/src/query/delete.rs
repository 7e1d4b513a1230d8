//! DELETE statements.

use crate::condition::{Condition, ConditionProvider};
use crate::config::Dialect;
use crate::error::SqlResult;
use crate::listener::QueryType;
use crate::query::{Mutation, Query, render_target_declaration, target_alias};
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::table::Table;

/// DELETE statement builder: `delete from T [where ...]`.
///
/// Without conditions every row of the table is deleted. An aliased target
/// is declared as `delete from T t1`, or `delete t1 from T t1` on MySQL and
/// SQL Server.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table: Table,
    conditions: ConditionProvider,
}

impl DeleteQuery {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            conditions: ConditionProvider::new(),
        }
    }

    pub fn add_conditions(&mut self, condition: Condition) -> &mut Self {
        self.conditions.add(condition);
        self
    }
}

impl QueryPart for DeleteQuery {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.with_reference(|ctx| {
            match (ctx.dialect(), target_alias(&self.table)) {
                (Dialect::SqlServer | Dialect::MySql, Some(alias)) => {
                    ctx.sql("delete ").identifier(alias).sql(" from ");
                }
                _ => {
                    ctx.sql("delete from ");
                }
            }
            render_target_declaration(ctx, &self.table);
            self.conditions.render_clause(ctx, "where");
        })
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| self.conditions.bind_clause(ctx))
    }
}

impl Query for DeleteQuery {
    fn query_type(&self) -> QueryType {
        QueryType::Delete
    }
}

impl Mutation for DeleteQuery {}
