//! Table expressions: base tables, aliases, joins and derived tables.
//!
//! A [`Table`] is a cheap handle over a shared node. Aliasing wraps the same
//! node, and columns created from a handle are qualified with that handle's
//! reference name (the alias if aliased, else the base name). Self-joins
//! therefore resolve purely from which handle a column was created against:
//!
//! ```ignore
//! let t = Table::new("T");
//! let id: Field<i32> = t.field("id");
//! let (t1, t2) = (t.alias("t1"), t.alias("t2"));
//! let joined = t1.join(&t2, t1.get_field(&id).eq_field(&t2.get_field(&id)));
//! // T t1 join T t2 on t1.id = t2.id
//! ```

use std::sync::Arc;

use crate::condition::Condition;
use crate::error::SqlResult;
use crate::field::{Expr, Field};
use crate::ident::Name;
use crate::query::Select;
use crate::render::{BindContext, QueryPart, RenderContext};

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "join",
            JoinKind::LeftOuter => "left outer join",
            JoinKind::RightOuter => "right outer join",
            JoinKind::FullOuter => "full outer join",
            JoinKind::Cross => "cross join",
        }
    }
}

#[derive(Debug)]
enum TableNode {
    Base {
        name: Name,
    },
    Aliased {
        inner: Table,
        alias: String,
    },
    Join {
        left: Table,
        right: Table,
        kind: JoinKind,
        on: Option<Condition>,
    },
    Derived {
        select: Select,
        alias: String,
    },
}

/// A table expression.
#[derive(Debug, Clone)]
pub struct Table {
    node: Arc<TableNode>,
}

impl Table {
    fn from_node(node: TableNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// A base table.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_node(TableNode::Base {
            name: Name::new(name),
        })
    }

    /// A schema-qualified base table.
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_node(TableNode::Base {
            name: Name::qualified(schema, name),
        })
    }

    /// A base table from a possibly dotted/quoted name (`public."Users"`).
    pub fn parse(name: &str) -> SqlResult<Self> {
        Ok(Self::from_node(TableNode::Base {
            name: Name::parse(name)?,
        }))
    }

    /// A derived table: `(select ...) alias`.
    pub fn derived(select: impl Into<Select>, alias: impl Into<String>) -> Self {
        Self::from_node(TableNode::Derived {
            select: select.into(),
            alias: alias.into(),
        })
    }

    /// The same table under an alias.
    pub fn alias(&self, alias: impl Into<String>) -> Table {
        let alias = alias.into();
        match self.node.as_ref() {
            TableNode::Aliased { inner, .. } => inner.alias(alias),
            TableNode::Derived { select, .. } => Table::from_node(TableNode::Derived {
                select: select.clone(),
                alias,
            }),
            _ => Table::from_node(TableNode::Aliased {
                inner: self.clone(),
                alias,
            }),
        }
    }

    /// The base table name, looking through aliases.
    pub fn name(&self) -> Option<&Name> {
        match self.node.as_ref() {
            TableNode::Base { name } => Some(name),
            TableNode::Aliased { inner, .. } => inner.name(),
            _ => None,
        }
    }

    /// The alias, if this handle is aliased or derived.
    pub fn alias_name(&self) -> Option<&str> {
        match self.node.as_ref() {
            TableNode::Aliased { alias, .. } | TableNode::Derived { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// The name columns of this table are qualified with.
    pub fn reference_name(&self) -> Option<Name> {
        match self.node.as_ref() {
            TableNode::Base { name } => Some(name.clone()),
            TableNode::Aliased { alias, .. } | TableNode::Derived { alias, .. } => {
                Some(Name::new(alias.clone()))
            }
            TableNode::Join { .. } => None,
        }
    }

    /// A column of this table.
    pub fn field<T>(&self, name: impl Into<String>) -> Field<T> {
        Field::from_expr(Expr::Column {
            qualifier: self.reference_name(),
            name: name.into(),
        })
    }

    /// The same column as `field`, qualified with this table's reference name.
    ///
    /// An alias on `field` is kept. Non-column expressions are returned as-is.
    pub fn get_field<T>(&self, field: &Field<T>) -> Field<T> {
        Field::from_expr(self.requalify(field.expr()))
    }

    fn requalify(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Column { name, .. } => Expr::Column {
                qualifier: self.reference_name(),
                name: name.clone(),
            },
            Expr::Aliased { inner, alias } => Expr::Aliased {
                inner: Box::new(self.requalify(inner)),
                alias: alias.clone(),
            },
            other => other.clone(),
        }
    }

    /// `self join other on condition`.
    pub fn join(&self, other: &Table, on: Condition) -> Table {
        self.join_with(JoinKind::Inner, other, Some(on))
    }

    pub fn left_outer_join(&self, other: &Table, on: Condition) -> Table {
        self.join_with(JoinKind::LeftOuter, other, Some(on))
    }

    pub fn right_outer_join(&self, other: &Table, on: Condition) -> Table {
        self.join_with(JoinKind::RightOuter, other, Some(on))
    }

    pub fn full_outer_join(&self, other: &Table, on: Condition) -> Table {
        self.join_with(JoinKind::FullOuter, other, Some(on))
    }

    pub fn cross_join(&self, other: &Table) -> Table {
        self.join_with(JoinKind::Cross, other, None)
    }

    /// A join of any kind; without a condition no `on` clause is rendered.
    pub fn join_with(&self, kind: JoinKind, other: &Table, on: Option<Condition>) -> Table {
        Table::from_node(TableNode::Join {
            left: self.clone(),
            right: other.clone(),
            kind,
            on,
        })
    }
}

impl QueryPart for Table {
    fn render(&self, ctx: &mut RenderContext) {
        match self.node.as_ref() {
            TableNode::Base { name } => {
                ctx.name(name);
            }
            TableNode::Aliased { inner, alias } => {
                if ctx.declare_tables() {
                    ctx.visit(inner).sql(" ");
                }
                ctx.identifier(alias);
            }
            TableNode::Join {
                left,
                right,
                kind,
                on,
            } => {
                ctx.visit(left);
                render_join(ctx, *kind, right, on.as_ref());
            }
            TableNode::Derived { select, alias } => {
                if ctx.declare_tables() {
                    ctx.visit_parenthesized(select).sql(" ");
                }
                ctx.identifier(alias);
            }
        }
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        match self.node.as_ref() {
            TableNode::Base { .. } => Ok(()),
            TableNode::Aliased { inner, .. } => {
                if ctx.declare_tables() {
                    ctx.visit(inner)?;
                }
                Ok(())
            }
            TableNode::Join {
                left, right, on, ..
            } => {
                ctx.visit(left)?;
                bind_join(ctx, right, on.as_ref())
            }
            TableNode::Derived { select, .. } => {
                if ctx.declare_tables() {
                    ctx.visit(select)?;
                }
                Ok(())
            }
        }
    }
}

/// ` <kind> right [on condition]`.
pub(crate) fn render_join(
    ctx: &mut RenderContext,
    kind: JoinKind,
    right: &Table,
    on: Option<&Condition>,
) {
    ctx.sql(" ").sql(kind.keyword()).sql(" ");
    ctx.visit(right);
    if let Some(on) = on {
        ctx.sql(" on ").visit(on);
    }
}

pub(crate) fn bind_join(
    ctx: &mut BindContext<'_>,
    right: &Table,
    on: Option<&Condition>,
) -> SqlResult<()> {
    ctx.visit(right)?;
    if let Some(on) = on {
        ctx.visit(on)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, Dialect};
    use crate::render::{ParamList, bind};

    fn declared(table: &Table, cfg: Configuration) -> String {
        let mut ctx = RenderContext::new(cfg);
        ctx.with_declare_tables(true, |ctx| {
            ctx.visit(table);
        });
        ctx.finish()
    }

    #[test]
    fn base_and_schema_tables() {
        let cfg = Configuration::default();
        assert_eq!(declared(&Table::new("T"), cfg), "T");
        assert_eq!(declared(&Table::with_schema("s", "T"), cfg), "s.T");
        assert_eq!(
            declared(&Table::parse(r#"public."Users""#).unwrap(), Configuration::new(Dialect::MySql)),
            "public.`Users`"
        );
        assert!(Table::parse("bad name").is_err());
    }

    #[test]
    fn alias_declares_and_references() {
        let t = Table::new("T").alias("t1");
        assert_eq!(declared(&t, Configuration::default()), "T t1");
        assert_eq!(crate::render::render(&t, &Configuration::default()).unwrap(), "t1");
        assert_eq!(t.name().map(Name::last), Some("T"));
        assert_eq!(t.alias("t2").alias_name(), Some("t2"));
        assert_eq!(declared(&t.alias("t2"), Configuration::default()), "T t2");
    }

    #[test]
    fn fields_are_qualified_by_reference_name() {
        let t = Table::new("T");
        let id: Field<i32> = t.field("id");
        let cfg = Configuration::default();
        assert_eq!(crate::render::render(&id, &cfg).unwrap(), "T.id");
        let t1 = t.alias("t1");
        assert_eq!(crate::render::render(&t1.get_field(&id), &cfg).unwrap(), "t1.id");

        let f1 = t1.get_field(&id.alias("f1"));
        let mut ctx = RenderContext::new(cfg);
        ctx.with_declare_fields(true, |ctx| {
            ctx.visit(&f1);
        });
        assert_eq!(ctx.finish(), "t1.id f1");
    }

    #[test]
    fn self_join() {
        let t = Table::new("T");
        let id: Field<i32> = t.field("id");
        let (t1, t2) = (t.alias("t1"), t.alias("t2"));
        let joined = t1.join(&t2, t1.get_field(&id).eq_field(&t2.get_field(&id)));
        let cfg = Configuration::default();
        assert_eq!(declared(&joined, cfg), "T t1 join T t2 on t1.id = t2.id");

        let mut params = ParamList::new();
        assert_eq!(bind(&joined, &cfg, &mut params, 1).unwrap(), 1);
    }

    #[test]
    fn join_kinds() {
        let a = Table::new("A");
        let b = Table::new("B");
        let on = a.field::<i32>("id").eq_field(&b.field("a_id"));
        let cfg = Configuration::default();
        assert_eq!(
            declared(&a.left_outer_join(&b, on.clone()), cfg),
            "A left outer join B on A.id = B.a_id"
        );
        assert_eq!(
            declared(&a.full_outer_join(&b, on), cfg),
            "A full outer join B on A.id = B.a_id"
        );
        assert_eq!(declared(&a.cross_join(&b), cfg), "A cross join B");
    }
}
