//! Boolean conditions for `where`, `having` and `on` clauses.
//!
//! Conditions are built from [`Field`](crate::Field) comparisons and combined
//! with `and`/`or`/`not`. Each `and`/`or` call builds a fresh binary node, so
//! the tree shape mirrors the call chain:
//!
//! ```ignore
//! let c = a.and(b).or(c.and(d));
//! // ((a and b) or (c and d))
//! ```
//!
//! A combined node renders its *effective* children only: `True` is dropped
//! under `and`, `False` under `or`. No effective children renders `1 = 1` for
//! `and` and `1 = 0` for `or`; one renders unwrapped; two or more render
//! parenthesized.

use std::ops;

use crate::error::{SqlError, SqlResult};
use crate::field::Expr;
use crate::query::Select;
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::value::Value;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Like => "like",
            Comparator::NotLike => "not like",
        }
    }
}

/// Logical combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

/// `any` / `all` for quantified comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

impl Quantifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantifier::Any => "any",
            Quantifier::All => "all",
        }
    }
}

/// A boolean condition node.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Always true: `1 = 1`.
    True,
    /// Always false: `1 = 0`.
    False,
    Compare {
        left: Expr,
        op: Comparator,
        right: Expr,
    },
    Between {
        field: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
    },
    /// `in (...)` over literal values.
    InList {
        field: Expr,
        values: Vec<Expr>,
        negated: bool,
    },
    /// `in (select ...)`.
    InSelect {
        field: Expr,
        select: Box<Select>,
        negated: bool,
    },
    /// `field op any|all (select ...)`.
    Quantified {
        field: Expr,
        op: Comparator,
        quantifier: Quantifier,
        select: Box<Select>,
    },
    IsNull {
        field: Expr,
        negated: bool,
    },
    Exists {
        select: Box<Select>,
        negated: bool,
    },
    /// A raw SQL fragment with one `?` per binding.
    PlainText {
        template: String,
        bindings: Vec<Value>,
    },
    Combined {
        operator: Operator,
        conditions: Vec<Condition>,
    },
    Not(Box<Condition>),
}

impl Condition {
    /// A raw SQL fragment.
    ///
    /// Each `?` outside a single-quoted string is replaced by a placeholder (or
    /// by the inlined literal) for the binding at the same position.
    pub fn plain(template: impl Into<String>, bindings: Vec<Value>) -> SqlResult<Condition> {
        let template = template.into();
        let placeholders = count_placeholders(&template);
        if placeholders != bindings.len() {
            return Err(SqlError::BindCountMismatch {
                placeholders,
                bindings: bindings.len(),
            });
        }
        Ok(Condition::PlainText { template, bindings })
    }

    /// `exists (select ...)`.
    pub fn exists(select: impl Into<Select>) -> Condition {
        Condition::Exists {
            select: Box::new(select.into()),
            negated: false,
        }
    }

    /// `not exists (select ...)`.
    pub fn not_exists(select: impl Into<Select>) -> Condition {
        Condition::Exists {
            select: Box::new(select.into()),
            negated: true,
        }
    }

    /// Combine any number of conditions under one operator.
    pub fn combine(operator: Operator, conditions: impl IntoIterator<Item = Condition>) -> Condition {
        Condition::Combined {
            operator,
            conditions: conditions.into_iter().collect(),
        }
    }

    /// `(self and other)`.
    pub fn and(self, other: Condition) -> Condition {
        Condition::combine(Operator::And, [self, other])
    }

    /// `(self or other)`.
    pub fn or(self, other: Condition) -> Condition {
        Condition::combine(Operator::Or, [self, other])
    }

    /// `(self and not (other))`.
    pub fn and_not(self, other: Condition) -> Condition {
        self.and(other.not())
    }

    /// `(self or not (other))`.
    pub fn or_not(self, other: Condition) -> Condition {
        self.or(other.not())
    }

    /// `not (self)`.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    /// Whether this condition is trivially true (`True` or an empty `and`).
    pub fn is_true(&self) -> bool {
        match self {
            Condition::True => true,
            Condition::Combined {
                operator: Operator::And,
                conditions,
            } => effective(Operator::And, conditions).is_empty(),
            _ => false,
        }
    }

    /// Whether this condition is trivially false (`False` or an empty `or`).
    pub fn is_false(&self) -> bool {
        match self {
            Condition::False => true,
            Condition::Combined {
                operator: Operator::Or,
                conditions,
            } => effective(Operator::Or, conditions).is_empty(),
            _ => false,
        }
    }

    fn render_inner(&self, ctx: &mut RenderContext) {
        match self {
            Condition::True => {
                ctx.sql("1 = 1");
            }
            Condition::False => {
                ctx.sql("1 = 0");
            }
            Condition::Compare { left, op, right } => {
                ctx.visit(left).sql(" ").sql(op.as_str()).sql(" ").visit(right);
            }
            Condition::Between {
                field,
                low,
                high,
                negated,
            } => {
                ctx.visit(field);
                ctx.sql(if *negated { " not between " } else { " between " });
                ctx.visit(low).sql(" and ").visit(high);
            }
            Condition::InList {
                field,
                values,
                negated,
            } => {
                if values.is_empty() {
                    ctx.sql(if *negated { "1 = 1" } else { "1 = 0" });
                } else {
                    ctx.visit(field);
                    ctx.sql(if *negated { " not in (" } else { " in (" });
                    ctx.visit_list(values, ", ").sql(")");
                }
            }
            Condition::InSelect {
                field,
                select,
                negated,
            } => {
                ctx.visit(field);
                ctx.sql(if *negated { " not in " } else { " in " });
                ctx.visit_parenthesized(select.as_ref());
            }
            Condition::Quantified {
                field,
                op,
                quantifier,
                select,
            } => {
                ctx.visit(field)
                    .sql(" ")
                    .sql(op.as_str())
                    .sql(" ")
                    .sql(quantifier.as_str())
                    .sql(" ")
                    .visit_parenthesized(select.as_ref());
            }
            Condition::IsNull { field, negated } => {
                ctx.visit(field);
                ctx.sql(if *negated { " is not null" } else { " is null" });
            }
            Condition::Exists { select, negated } => {
                ctx.sql(if *negated { "not exists " } else { "exists " });
                ctx.visit_parenthesized(select.as_ref());
            }
            Condition::PlainText { template, bindings } => {
                render_template(ctx, template, bindings);
            }
            Condition::Combined {
                operator,
                conditions,
            } => render_combined(ctx, *operator, conditions),
            Condition::Not(inner) => {
                ctx.sql("not (");
                inner.render_inner(ctx);
                ctx.sql(")");
            }
        }
    }

    fn bind_inner(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        match self {
            Condition::True | Condition::False => Ok(()),
            Condition::Compare { left, right, .. } => {
                ctx.visit(left)?;
                ctx.visit(right)
            }
            Condition::Between {
                field, low, high, ..
            } => {
                ctx.visit(field)?;
                ctx.visit(low)?;
                ctx.visit(high)
            }
            Condition::InList { field, values, .. } => {
                if values.is_empty() {
                    return Ok(());
                }
                ctx.visit(field)?;
                ctx.visit_list(values)
            }
            Condition::InSelect { field, select, .. }
            | Condition::Quantified { field, select, .. } => {
                ctx.visit(field)?;
                ctx.visit(select.as_ref())
            }
            Condition::IsNull { field, .. } => ctx.visit(field),
            Condition::Exists { select, .. } => ctx.visit(select.as_ref()),
            Condition::PlainText { bindings, .. } => {
                for value in bindings {
                    ctx.value(value)?;
                }
                Ok(())
            }
            Condition::Combined {
                operator,
                conditions,
            } => bind_combined(ctx, *operator, conditions),
            Condition::Not(inner) => inner.bind_inner(ctx),
        }
    }
}

impl QueryPart for Condition {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.with_reference(|ctx| self.render_inner(ctx))
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| self.bind_inner(ctx))
    }
}

impl ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

/// Children that affect the result of combining under `operator`.
pub(crate) fn effective(operator: Operator, conditions: &[Condition]) -> Vec<&Condition> {
    conditions
        .iter()
        .filter(|c| match operator {
            Operator::And => !c.is_true(),
            Operator::Or => !c.is_false(),
        })
        .collect()
}

pub(crate) fn render_combined(ctx: &mut RenderContext, operator: Operator, conditions: &[Condition]) {
    let children = effective(operator, conditions);
    match children.as_slice() {
        [] => {
            ctx.sql(match operator {
                Operator::And => "1 = 1",
                Operator::Or => "1 = 0",
            });
        }
        [only] => only.render_inner(ctx),
        many => {
            ctx.sql("(");
            for (i, child) in many.iter().enumerate() {
                if i > 0 {
                    ctx.sql(" ").sql(operator.as_str()).sql(" ");
                }
                child.render_inner(ctx);
            }
            ctx.sql(")");
        }
    }
}

pub(crate) fn bind_combined(
    ctx: &mut BindContext<'_>,
    operator: Operator,
    conditions: &[Condition],
) -> SqlResult<()> {
    for child in effective(operator, conditions) {
        child.bind_inner(ctx)?;
    }
    Ok(())
}

/// Positions of `?` markers outside string literals and quoted identifiers.
///
/// Single quotes, double quotes and backticks each open a quoted run closed
/// by the same character; a doubled quote inside a run is an escape and
/// reopens it. Square brackets are not tracked since `a[?]` is an array
/// subscript in PostgreSQL.
fn placeholder_positions(template: &str) -> Vec<usize> {
    let mut quote: Option<char> = None;
    template
        .char_indices()
        .filter_map(|(i, c)| match (quote, c) {
            (None, '\'' | '"' | '`') => {
                quote = Some(c);
                None
            }
            (Some(q), c) if c == q => {
                quote = None;
                None
            }
            (None, '?') => Some(i),
            _ => None,
        })
        .collect()
}

fn count_placeholders(template: &str) -> usize {
    placeholder_positions(template).len()
}

fn render_template(ctx: &mut RenderContext, template: &str, bindings: &[Value]) {
    let mut last = 0;
    for (pos, value) in placeholder_positions(template).into_iter().zip(bindings) {
        ctx.sql(&template[last..pos]).value(value);
        last = pos + 1;
    }
    ctx.sql(&template[last..]);
}

/// The conditions of a `where`/`having` clause, implicitly joined by `and`.
#[derive(Debug, Clone, Default)]
pub struct ConditionProvider {
    conditions: Vec<Condition>,
}

impl ConditionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn extend(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.conditions.extend(conditions);
    }

    /// No effective conditions: the clause is omitted.
    pub fn is_empty(&self) -> bool {
        effective(Operator::And, &self.conditions).is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Render ` <keyword> <conditions>` when not empty.
    pub(crate) fn render_clause(&self, ctx: &mut RenderContext, keyword: &str) {
        if self.is_empty() {
            return;
        }
        ctx.sql(" ").sql(keyword).sql(" ");
        ctx.with_reference(|ctx| render_combined(ctx, Operator::And, &self.conditions));
    }

    pub(crate) fn bind_clause(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| bind_combined(ctx, Operator::And, &self.conditions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, Dialect};
    use crate::field::Field;
    use crate::ident::Name;
    use crate::render::{ParamList, bind, render};

    fn col<T>(name: &str) -> Field<T> {
        Field::from_expr(Expr::qualified_column(Name::new("T"), name))
    }

    fn inline() -> Configuration {
        Configuration::default().inline()
    }

    fn bound(c: &Condition, cfg: &Configuration) -> ParamList {
        let mut params = ParamList::new();
        let next = bind(c, cfg, &mut params, 1).unwrap();
        assert_eq!(next, params.len() + 1);
        params
    }

    #[test]
    fn comparisons_render_lowercase_operators() {
        let id = col::<i32>("ID");
        assert_eq!(render(&id.eq(1), &inline()).unwrap(), "T.ID = 1");
        assert_eq!(render(&id.ne(1), &inline()).unwrap(), "T.ID <> 1");
        assert_eq!(render(&id.le(1), &inline()).unwrap(), "T.ID <= 1");
        assert_eq!(render(&id.between(1, 5), &inline()).unwrap(), "T.ID between 1 and 5");
        assert_eq!(render(&id.not_between(1, 5), &inline()).unwrap(), "T.ID not between 1 and 5");
        assert_eq!(render(&id.is_null(), &inline()).unwrap(), "T.ID is null");
        assert_eq!(render(&id.is_not_null(), &inline()).unwrap(), "T.ID is not null");
        let name = col::<String>("NAME");
        assert_eq!(render(&name.like("A%"), &inline()).unwrap(), "T.NAME like 'A%'");
        assert_eq!(render(&name.not_like("A%"), &inline()).unwrap(), "T.NAME not like 'A%'");
    }

    #[test]
    fn and_or_parenthesize_by_call_shape() {
        let id = col::<i32>("ID");
        let c = id.eq(1).and(id.eq(2)).or(id.eq(3).and(id.eq(4)));
        assert_eq!(
            render(&c, &inline()).unwrap(),
            "((T.ID = 1 and T.ID = 2) or (T.ID = 3 and T.ID = 4))"
        );
        assert_eq!(
            render(&c, &Configuration::default()).unwrap(),
            "((T.ID = ? and T.ID = ?) or (T.ID = ? and T.ID = ?))"
        );
        let params = bound(&c, &Configuration::default());
        assert_eq!(
            params.values(),
            &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn empty_combination_is_a_tautology() {
        let c = Condition::combine(Operator::And, []);
        assert_eq!(render(&c, &Configuration::default()).unwrap(), "1 = 1");
        assert!(bound(&c, &Configuration::default()).is_empty());

        let c = Condition::combine(Operator::Or, []);
        assert_eq!(render(&c, &Configuration::default()).unwrap(), "1 = 0");
    }

    #[test]
    fn singleton_renders_like_its_child() {
        let id = col::<i32>("ID");
        let child = id.gt(3);
        let c = Condition::combine(Operator::And, [child.clone()]);
        assert_eq!(render(&c, &inline()).unwrap(), render(&child, &inline()).unwrap());
        let c = Condition::True.and(child.clone());
        assert_eq!(render(&c, &inline()).unwrap(), "T.ID > 3");
        let c = Condition::False.or(child);
        assert_eq!(render(&c, &inline()).unwrap(), "T.ID > 3");
    }

    #[test]
    fn nested_empty_chains_are_not_effective() {
        let id = col::<i32>("ID");
        let c = Condition::combine(Operator::And, []).and(id.eq(1));
        assert_eq!(render(&c, &inline()).unwrap(), "T.ID = 1");
    }

    #[test]
    fn in_lists() {
        let id = col::<i32>("ID");
        assert_eq!(render(&id.in_list([1, 2, 3]), &inline()).unwrap(), "T.ID in (1, 2, 3)");
        assert_eq!(render(&id.not_in([1]), &inline()).unwrap(), "T.ID not in (1)");
        assert_eq!(render(&id.in_list(Vec::<i32>::new()), &inline()).unwrap(), "1 = 0");
        assert_eq!(render(&id.not_in(Vec::<i32>::new()), &inline()).unwrap(), "1 = 1");
        let empty = id.in_list(Vec::<i32>::new());
        assert!(bound(&empty, &Configuration::default()).is_empty());
    }

    #[test]
    fn not_wraps_inner() {
        let id = col::<i32>("ID");
        assert_eq!(render(&id.eq(1).not(), &inline()).unwrap(), "not (T.ID = 1)");
        assert_eq!(render(&!id.eq(1), &inline()).unwrap(), "not (T.ID = 1)");
        assert_eq!(
            render(&id.eq(1).and_not(id.eq(2)), &inline()).unwrap(),
            "(T.ID = 1 and not (T.ID = 2))"
        );
    }

    #[test]
    fn plain_text_checks_binding_count() {
        let err = Condition::plain("a = ? and b = ?", vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            SqlError::BindCountMismatch {
                placeholders: 2,
                bindings: 1
            }
        ));
    }

    #[test]
    fn plain_text_ignores_markers_in_quoted_identifiers() {
        let c = Condition::plain(r#""it's" = ?"#, vec![Value::Int(1)]).unwrap();
        assert_eq!(render(&c, &inline()).unwrap(), r#""it's" = 1"#);

        let c = Condition::plain(
            r#""what?" = ? and `x?` = ?"#,
            vec![Value::Int(1), Value::Int(2)],
        ).unwrap();
        assert_eq!(
            render(&c, &Configuration::new(Dialect::Postgres)).unwrap(),
            r#""what?" = $1 and `x?` = $2"#
        );
        assert_eq!(bound(&c, &Configuration::default()).len(), 2);

        let c = Condition::plain(r#""a""?" = 'b''?' and y = ?"#, vec![Value::Int(3)]).unwrap();
        assert_eq!(render(&c, &inline()).unwrap(), r#""a""?" = 'b''?' and y = 3"#);
    }

    #[test]
    fn plain_text_substitutes_per_mode() {
        let c = Condition::plain(
            "x = ? and y <> '?' and z = ?",
            vec![Value::from("a'b"), Value::Int(2)],
        )
        .unwrap();
        assert_eq!(render(&c, &inline()).unwrap(), "x = 'a''b' and y <> '?' and z = 2");
        assert_eq!(
            render(&c, &Configuration::new(Dialect::Postgres)).unwrap(),
            "x = $1 and y <> '?' and z = $2"
        );
        assert_eq!(bound(&c, &Configuration::default()).len(), 2);
        assert!(bound(&c, &inline()).is_empty());
    }

    #[test]
    fn field_to_field_comparison_binds_nothing() {
        let a = col::<i32>("A");
        let b = col::<i32>("B");
        let c = a.eq_field(&b);
        assert_eq!(render(&c, &Configuration::default()).unwrap(), "T.A = T.B");
        assert!(bound(&c, &Configuration::default()).is_empty());
    }

    #[test]
    fn provider_omits_empty_clause() {
        let mut where_ = ConditionProvider::new();
        where_.add(Condition::True);
        assert!(where_.is_empty());
        let mut ctx = RenderContext::new(Configuration::default());
        where_.render_clause(&mut ctx, "where");
        assert_eq!(ctx.finish(), "");

        where_.add(col::<i32>("ID").eq(1));
        let mut ctx = RenderContext::new(Configuration::default());
        where_.render_clause(&mut ctx, "where");
        assert_eq!(ctx.finish(), " where T.ID = ?");
    }
}
