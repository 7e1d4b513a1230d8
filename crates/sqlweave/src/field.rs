//! Typed expressions.
//!
//! [`Expr`] is the untyped expression tree; [`Field<T>`] wraps one with the
//! host type `T` so comparisons only accept compatible values and fields.
//!
//! # Example
//!
//! ```ignore
//! use sqlweave::{Table, Field};
//!
//! let t = Table::new("T");
//! let id: Field<i32> = t.field("ID");
//! let cond = id.eq(1).and(t.field::<String>("NAME").like("A%"));
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::condition::{Comparator, Condition, Quantifier};
use crate::error::{SqlError, SqlResult};
use crate::ident::Name;
use crate::query::Select;
use crate::render::{BindContext, QueryPart, RenderContext};
use crate::value::{Numeric, SqlType, Value};

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

/// Untyped expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value: inlined or bound.
    Literal(Value),
    /// A column reference, optionally qualified by a table reference name.
    Column {
        qualifier: Option<Name>,
        name: String,
    },
    /// `inner alias` when declared, `alias` when referenced.
    Aliased { inner: Box<Expr>, alias: String },
    /// A function call.
    Function {
        name: &'static str,
        distinct: bool,
        args: Vec<Expr>,
    },
    /// An argument-less SQL function such as `current_date`.
    Keyword(&'static str),
    /// `*`, as in `count(*)`.
    Asterisk,
    /// `left op right`.
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A scalar subquery.
    Subquery(Box<Select>),
}

impl Expr {
    /// An unqualified column.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    /// A column qualified by a table reference name.
    pub fn qualified_column(qualifier: Name, name: impl Into<String>) -> Self {
        Expr::Column {
            qualifier: Some(qualifier),
            name: name.into(),
        }
    }

    /// A literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// The name a result column produced by this expression is read back by.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expr::Column { name, .. } => Some(name),
            Expr::Aliased { alias, .. } => Some(alias),
            Expr::Function { name, .. } | Expr::Keyword(name) => Some(name),
            _ => None,
        }
    }

    fn render_operand(&self, ctx: &mut RenderContext) {
        if matches!(self, Expr::Arithmetic { .. }) {
            ctx.visit_parenthesized(self);
        } else {
            ctx.visit(self);
        }
    }
}

impl QueryPart for Expr {
    fn render(&self, ctx: &mut RenderContext) {
        match self {
            Expr::Literal(value) => {
                ctx.value(value);
            }
            Expr::Column { qualifier, name } => {
                if let Some(qualifier) = qualifier {
                    ctx.name(qualifier).sql(".");
                }
                ctx.identifier(name);
            }
            Expr::Aliased { inner, alias } => {
                if ctx.declare_fields() {
                    ctx.with_declare_fields(false, |ctx| {
                        ctx.visit(inner.as_ref()).sql(" ");
                    });
                }
                ctx.identifier(alias);
            }
            Expr::Function {
                name,
                distinct,
                args,
            } => {
                ctx.sql(name).sql("(");
                if *distinct {
                    ctx.sql("distinct ");
                }
                ctx.with_reference(|ctx| {
                    ctx.visit_list(args, ", ");
                });
                ctx.sql(")");
            }
            Expr::Keyword(keyword) => {
                ctx.sql(keyword);
            }
            Expr::Asterisk => {
                ctx.sql("*");
            }
            Expr::Arithmetic { op, left, right } => ctx.with_reference(|ctx| {
                left.render_operand(ctx);
                ctx.sql(" ").sql(op.as_str()).sql(" ");
                right.render_operand(ctx);
            }),
            Expr::Subquery(select) => {
                ctx.visit_parenthesized(select.as_ref());
            }
        }
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        match self {
            Expr::Literal(value) => ctx.value(value),
            Expr::Column { .. } | Expr::Keyword(_) | Expr::Asterisk => Ok(()),
            Expr::Aliased { inner, .. } => {
                if ctx.declare_fields() {
                    ctx.with_declare_fields(false, |ctx| ctx.visit(inner.as_ref()))
                } else {
                    Ok(())
                }
            }
            Expr::Function { args, .. } => ctx.with_reference(|ctx| ctx.visit_list(args)),
            Expr::Arithmetic { left, right, .. } => ctx.with_reference(|ctx| {
                ctx.visit(left.as_ref())?;
                ctx.visit(right.as_ref())
            }),
            Expr::Subquery(select) => ctx.visit(select.as_ref()),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

/// An expression with host type `T`.
pub struct Field<T> {
    expr: Expr,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.expr).finish()
    }
}

impl<T> Field<T> {
    /// Wrap an untyped expression.
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _type: PhantomData,
        }
    }

    /// An unqualified column.
    pub fn column(name: impl Into<String>) -> Self {
        Self::from_expr(Expr::column(name))
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// See [`Expr::name`].
    pub fn name(&self) -> Option<&str> {
        self.expr.name()
    }

    /// The same expression under an alias.
    ///
    /// Re-aliasing replaces the previous alias.
    pub fn alias(&self, alias: impl Into<String>) -> Field<T> {
        let inner = match &self.expr {
            Expr::Aliased { inner, .. } => inner.clone(),
            other => Box::new(other.clone()),
        };
        Field::from_expr(Expr::Aliased {
            inner,
            alias: alias.into(),
        })
    }

    /// `self <op> other`.
    pub fn compare_field(&self, op: Comparator, other: &Field<T>) -> Condition {
        Condition::Compare {
            left: self.expr.clone(),
            op,
            right: other.expr.clone(),
        }
    }

    pub fn eq_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Eq, other)
    }

    pub fn ne_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Ne, other)
    }

    pub fn lt_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Lt, other)
    }

    pub fn le_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Le, other)
    }

    pub fn gt_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Gt, other)
    }

    pub fn ge_field(&self, other: &Field<T>) -> Condition {
        self.compare_field(Comparator::Ge, other)
    }

    /// `self like pattern`.
    pub fn like(&self, pattern: impl Into<String>) -> Condition {
        Condition::Compare {
            left: self.expr.clone(),
            op: Comparator::Like,
            right: Expr::Literal(Value::Text(pattern.into())),
        }
    }

    /// `self not like pattern`.
    pub fn not_like(&self, pattern: impl Into<String>) -> Condition {
        Condition::Compare {
            left: self.expr.clone(),
            op: Comparator::NotLike,
            right: Expr::Literal(Value::Text(pattern.into())),
        }
    }

    pub fn is_null(&self) -> Condition {
        Condition::IsNull {
            field: self.expr.clone(),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Condition {
        Condition::IsNull {
            field: self.expr.clone(),
            negated: true,
        }
    }

    /// `self <op> (select ...)`; the subquery must select exactly one column.
    pub fn compare_select(&self, op: Comparator, select: impl Into<Select>) -> SqlResult<Condition> {
        let select = single_column(select.into())?;
        Ok(Condition::Compare {
            left: self.expr.clone(),
            op,
            right: Expr::Subquery(Box::new(select)),
        })
    }

    pub fn eq_select(&self, select: impl Into<Select>) -> SqlResult<Condition> {
        self.compare_select(Comparator::Eq, select)
    }

    /// `self in (select ...)`.
    pub fn in_select(&self, select: impl Into<Select>) -> SqlResult<Condition> {
        Ok(Condition::InSelect {
            field: self.expr.clone(),
            select: Box::new(single_column(select.into())?),
            negated: false,
        })
    }

    /// `self not in (select ...)`.
    pub fn not_in_select(&self, select: impl Into<Select>) -> SqlResult<Condition> {
        Ok(Condition::InSelect {
            field: self.expr.clone(),
            select: Box::new(single_column(select.into())?),
            negated: true,
        })
    }

    /// `self <op> any (select ...)`.
    pub fn compare_any(&self, op: Comparator, select: impl Into<Select>) -> SqlResult<Condition> {
        self.quantified(op, Quantifier::Any, select.into())
    }

    /// `self <op> all (select ...)`.
    pub fn compare_all(&self, op: Comparator, select: impl Into<Select>) -> SqlResult<Condition> {
        self.quantified(op, Quantifier::All, select.into())
    }

    fn quantified(&self, op: Comparator, quantifier: Quantifier, select: Select) -> SqlResult<Condition> {
        Ok(Condition::Quantified {
            field: self.expr.clone(),
            op,
            quantifier,
            select: Box::new(single_column(select)?),
        })
    }

    pub fn asc(&self) -> SortField {
        SortField::new(self.expr.clone(), SortOrder::Asc)
    }

    pub fn desc(&self) -> SortField {
        SortField::new(self.expr.clone(), SortOrder::Desc)
    }

    /// `count(self)`.
    pub fn count(&self) -> Field<i64> {
        Field::from_expr(function_expr("count", false, vec![self.expr.clone()]))
    }

    /// `count(distinct self)`.
    pub fn count_distinct(&self) -> Field<i64> {
        Field::from_expr(function_expr("count", true, vec![self.expr.clone()]))
    }

    /// `min(self)`.
    pub fn min(&self) -> Field<T> {
        Field::from_expr(function_expr("min", false, vec![self.expr.clone()]))
    }

    /// `max(self)`.
    pub fn max(&self) -> Field<T> {
        Field::from_expr(function_expr("max", false, vec![self.expr.clone()]))
    }
}

impl<T: SqlType> Field<T> {
    /// `self <op> value`.
    pub fn compare(&self, op: Comparator, value: impl Into<T>) -> Condition {
        Condition::Compare {
            left: self.expr.clone(),
            op,
            right: Expr::Literal(value.into().into_value()),
        }
    }

    pub fn eq(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Eq, value)
    }

    pub fn ne(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Ne, value)
    }

    pub fn lt(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Lt, value)
    }

    pub fn le(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Le, value)
    }

    pub fn gt(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Gt, value)
    }

    pub fn ge(&self, value: impl Into<T>) -> Condition {
        self.compare(Comparator::Ge, value)
    }

    /// `self between low and high`.
    pub fn between(&self, low: impl Into<T>, high: impl Into<T>) -> Condition {
        self.range(low.into(), high.into(), false)
    }

    /// `self not between low and high`.
    pub fn not_between(&self, low: impl Into<T>, high: impl Into<T>) -> Condition {
        self.range(low.into(), high.into(), true)
    }

    fn range(&self, low: T, high: T, negated: bool) -> Condition {
        Condition::Between {
            field: self.expr.clone(),
            low: Expr::Literal(low.into_value()),
            high: Expr::Literal(high.into_value()),
            negated,
        }
    }

    /// `self in (v1, v2, ...)`; an empty list is never true.
    pub fn in_list<V, I>(&self, values: I) -> Condition
    where
        V: Into<T>,
        I: IntoIterator<Item = V>,
    {
        Condition::InList {
            field: self.expr.clone(),
            values: literals::<T, V, I>(values),
            negated: false,
        }
    }

    /// `self not in (v1, v2, ...)`; an empty list is always true.
    pub fn not_in<V, I>(&self, values: I) -> Condition
    where
        V: Into<T>,
        I: IntoIterator<Item = V>,
    {
        Condition::InList {
            field: self.expr.clone(),
            values: literals::<T, V, I>(values),
            negated: true,
        }
    }
}

impl<T: Numeric> Field<T> {
    fn arithmetic(&self, op: ArithmeticOp, right: Expr) -> Field<T> {
        Field::from_expr(Expr::Arithmetic {
            op,
            left: Box::new(self.expr.clone()),
            right: Box::new(right),
        })
    }

    pub fn add(&self, value: impl Into<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Add, Expr::Literal(value.into().into_value()))
    }

    pub fn sub(&self, value: impl Into<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Sub, Expr::Literal(value.into().into_value()))
    }

    pub fn mul(&self, value: impl Into<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Mul, Expr::Literal(value.into().into_value()))
    }

    pub fn div(&self, value: impl Into<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Div, Expr::Literal(value.into().into_value()))
    }

    pub fn add_field(&self, other: &Field<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Add, other.expr.clone())
    }

    pub fn sub_field(&self, other: &Field<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Sub, other.expr.clone())
    }

    pub fn mul_field(&self, other: &Field<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Mul, other.expr.clone())
    }

    pub fn div_field(&self, other: &Field<T>) -> Field<T> {
        self.arithmetic(ArithmeticOp::Div, other.expr.clone())
    }

    /// `sum(self)`.
    pub fn sum(&self) -> Field<T> {
        Field::from_expr(function_expr("sum", false, vec![self.expr.clone()]))
    }

    /// `avg(self)`.
    pub fn avg(&self) -> Field<f64> {
        Field::from_expr(function_expr("avg", false, vec![self.expr.clone()]))
    }
}

impl Field<String> {
    pub fn upper(&self) -> Field<String> {
        Field::from_expr(function_expr("upper", false, vec![self.expr.clone()]))
    }

    pub fn lower(&self) -> Field<String> {
        Field::from_expr(function_expr("lower", false, vec![self.expr.clone()]))
    }

    pub fn trim(&self) -> Field<String> {
        Field::from_expr(function_expr("trim", false, vec![self.expr.clone()]))
    }

    pub fn length(&self) -> Field<i32> {
        Field::from_expr(function_expr("length", false, vec![self.expr.clone()]))
    }

    /// `concat(self, other)`.
    pub fn concat(&self, other: &Field<String>) -> Field<String> {
        Field::from_expr(function_expr(
            "concat",
            false,
            vec![self.expr.clone(), other.expr.clone()],
        ))
    }
}

impl<T> QueryPart for Field<T> {
    fn render(&self, ctx: &mut RenderContext) {
        self.expr.render(ctx)
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        self.expr.bind(ctx)
    }
}

impl<T> From<Field<T>> for Expr {
    fn from(field: Field<T>) -> Self {
        field.expr
    }
}

impl<T> From<&Field<T>> for Expr {
    fn from(field: &Field<T>) -> Self {
        field.expr.clone()
    }
}

pub(crate) fn function_expr(name: &'static str, distinct: bool, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name,
        distinct,
        args,
    }
}

fn literals<T, V, I>(values: I) -> Vec<Expr>
where
    T: SqlType,
    V: Into<T>,
    I: IntoIterator<Item = V>,
{
    values
        .into_iter()
        .map(|v| Expr::Literal(v.into().into_value()))
        .collect()
}

fn single_column(select: Select) -> SqlResult<Select> {
    match select.column_count() {
        Some(actual) if actual != 1 => Err(SqlError::SubqueryColumns {
            expected: 1,
            actual,
        }),
        _ => Ok(select),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// No explicit direction.
    #[default]
    Default,
    Asc,
    Desc,
}

/// An `order by` item.
#[derive(Debug, Clone)]
pub struct SortField {
    expr: Expr,
    order: SortOrder,
}

impl SortField {
    pub fn new(expr: Expr, order: SortOrder) -> Self {
        Self { expr, order }
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl QueryPart for SortField {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.with_reference(|ctx| {
            ctx.visit(&self.expr);
        });
        match self.order {
            SortOrder::Default => {}
            SortOrder::Asc => {
                ctx.sql(" asc");
            }
            SortOrder::Desc => {
                ctx.sql(" desc");
            }
        }
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        ctx.with_reference(|ctx| ctx.visit(&self.expr))
    }
}

impl<T> From<Field<T>> for SortField {
    fn from(field: Field<T>) -> Self {
        SortField::new(field.expr, SortOrder::Default)
    }
}

impl<T> From<&Field<T>> for SortField {
    fn from(field: &Field<T>) -> Self {
        SortField::new(field.expr.clone(), SortOrder::Default)
    }
}
