//! UPDATE statements.

use crate::condition::{Condition, ConditionProvider};
use crate::config::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::field::{Expr, Field};
use crate::listener::QueryType;
use crate::query::{
    Mutation, Query, bind_target_column, render_target_column, render_target_declaration,
    target_alias,
};
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::table::Table;
use crate::value::{SqlType, Value};

/// UPDATE statement builder: `update T set A = ?, B = ? [where ...]`.
///
/// An aliased target is declared as `update T t1 set ...`.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: Table,
    assignments: Vec<(Expr, Expr)>,
    conditions: ConditionProvider,
}

impl UpdateQuery {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Vec::new(),
            conditions: ConditionProvider::new(),
        }
    }

    /// `field = value`.
    pub fn add_value<T: SqlType>(&mut self, field: &Field<T>, value: impl Into<T>) -> &mut Self {
        self.assignments.push((
            field.expr().clone(),
            Expr::Literal(value.into().into_value()),
        ));
        self
    }

    /// `field = expression`, e.g. `COUNT = COUNT + 1`.
    pub fn add_value_field<T>(&mut self, field: &Field<T>, value: &Field<T>) -> &mut Self {
        self.assignments
            .push((field.expr().clone(), value.expr().clone()));
        self
    }

    /// `field = null`.
    pub fn add_null<T>(&mut self, field: &Field<T>) -> &mut Self {
        self.assignments
            .push((field.expr().clone(), Expr::Literal(Value::Null)));
        self
    }

    pub fn add_conditions(&mut self, condition: Condition) -> &mut Self {
        self.conditions.add(condition);
        self
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl QueryPart for UpdateQuery {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.with_reference(|ctx| {
            // SQL Server names the alias after UPDATE and declares it in FROM.
            let from_clause = match (ctx.dialect(), target_alias(&self.table)) {
                (Dialect::SqlServer, Some(alias)) => {
                    ctx.sql("update ").identifier(alias);
                    true
                }
                _ => {
                    ctx.sql("update ");
                    render_target_declaration(ctx, &self.table);
                    false
                }
            };
            ctx.sql(" set ");
            for (i, (column, value)) in self.assignments.iter().enumerate() {
                if i > 0 {
                    ctx.sql(", ");
                }
                render_target_column(ctx, column);
                ctx.sql(" = ").visit(value);
            }
            if from_clause {
                ctx.sql(" from ");
                render_target_declaration(ctx, &self.table);
            }
            self.conditions.render_clause(ctx, "where");
        })
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| {
            for (column, value) in &self.assignments {
                bind_target_column(ctx, column)?;
                ctx.visit(value)?;
            }
            self.conditions.bind_clause(ctx)
        })
    }

    fn validate(&self) -> SqlResult<()> {
        if self.is_empty() {
            return Err(SqlError::EmptyStatement("update"));
        }
        Ok(())
    }
}

impl Query for UpdateQuery {
    fn query_type(&self) -> QueryType {
        QueryType::Update
    }
}

impl Mutation for UpdateQuery {}
