//! The two-pass render + bind protocol.
//!
//! Every node of a statement tree implements [`QueryPart`]. Rendering walks the
//! tree and writes SQL text into a [`RenderContext`]; binding walks the *same*
//! node kinds in the *same* order and writes each runtime value into a
//! [`BindSink`] through a [`BindContext`]. Both contexts carry the same
//! declaration/reference flags, so a node that renders no placeholder in a
//! given position never binds a value there either.
//!
//! # Example
//!
//! ```ignore
//! use sqlweave::render::{bind, render, ParamList};
//!
//! let cfg = Configuration::default();
//! let sql = render(&condition, &cfg)?;
//! let mut params = ParamList::new();
//! let next = bind(&condition, &cfg, &mut params, 1)?;
//! assert_eq!(next - 1, params.len());
//! ```

use crate::config::{Configuration, Dialect};
use crate::error::{SqlError, SqlResult};
use crate::ident::{Name, write_identifier};
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A node that renders to SQL and binds its runtime values.
///
/// Implementations must bind exactly the values whose placeholders they
/// render, in the order they render them.
pub trait QueryPart {
    /// Render this node into `ctx`.
    fn render(&self, ctx: &mut RenderContext);

    /// Bind this node's values into `ctx`.
    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()>;

    /// Check builder state before rendering. Statements that cannot be
    /// rendered (an INSERT with no columns) fail here.
    fn validate(&self) -> SqlResult<()> {
        Ok(())
    }
}

impl<P: QueryPart + ?Sized> QueryPart for &P {
    fn render(&self, ctx: &mut RenderContext) {
        (**self).render(ctx)
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        (**self).bind(ctx)
    }
    fn validate(&self) -> SqlResult<()> {
        (**self).validate()
    }
}

impl<P: QueryPart + ?Sized> QueryPart for Box<P> {
    fn render(&self, ctx: &mut RenderContext) {
        (**self).render(ctx)
    }

    fn bind(&self, ctx: &mut BindContext<'_>) -> SqlResult<()> {
        (**self).bind(ctx)
    }
    fn validate(&self) -> SqlResult<()> {
        (**self).validate()
    }
}

/// Validate, then render a node to SQL text.
pub fn render<P: QueryPart + ?Sized>(part: &P, config: &Configuration) -> SqlResult<String> {
    part.validate()?;
    let mut ctx = RenderContext::new(*config);
    part.render(&mut ctx);
    Ok(ctx.finish())
}

/// Validate, then bind a node's values into `sink`, starting at the 1-based
/// `start` index.
///
/// Returns the next free index. Nothing is written when validation fails.
pub fn bind<P: QueryPart + ?Sized>(
    part: &P,
    config: &Configuration,
    sink: &mut dyn BindSink,
    start: usize,
) -> SqlResult<usize> {
    part.validate()?;
    let mut ctx = BindContext::new(*config, sink, start);
    part.bind(&mut ctx)?;
    Ok(ctx.index())
}

/// Whether the current position introduces fields/tables or refers to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Scope {
    declare_fields: bool,
    declare_tables: bool,
}

/// Rendering state: configuration, output buffer, mode flags, placeholder counter.
#[derive(Debug)]
pub struct RenderContext {
    config: Configuration,
    sql: String,
    scope: Scope,
    next_param: usize,
}

impl RenderContext {
    /// Create an empty context for a configuration.
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            sql: String::new(),
            scope: Scope::default(),
            next_param: 1,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Whether literals are rendered inline.
    pub fn inline(&self) -> bool {
        self.config.inline_parameters
    }

    /// Whether fields are being declared (select list) rather than referenced.
    pub fn declare_fields(&self) -> bool {
        self.scope.declare_fields
    }

    /// Whether tables are being declared (FROM clause) rather than referenced.
    pub fn declare_tables(&self) -> bool {
        self.scope.declare_tables
    }

    /// Run `f` with field declaration switched on or off, restoring it afterwards.
    pub fn with_declare_fields<R>(&mut self, on: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope.declare_fields = on;
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Run `f` with table declaration switched on or off, restoring it afterwards.
    pub fn with_declare_tables<R>(&mut self, on: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope.declare_tables = on;
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Run `f` in pure reference mode (no field or table declarations).
    pub fn with_reference<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope = Scope::default();
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Append raw SQL text.
    pub fn sql(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    /// Append an identifier, quoting it if the dialect requires.
    pub fn identifier(&mut self, name: &str) -> &mut Self {
        write_identifier(self.config.dialect, name, &mut self.sql);
        self
    }

    /// Append a possibly qualified name.
    pub fn name(&mut self, name: &Name) -> &mut Self {
        name.write_sql(self.config.dialect, &mut self.sql);
        self
    }

    /// Append the next placeholder (`?` or `$n`).
    pub fn placeholder(&mut self) -> &mut Self {
        let token = self.config.dialect.placeholder(self.next_param);
        self.next_param += 1;
        self.sql.push_str(&token);
        self
    }

    /// Append a value: inline literal or placeholder, depending on the mode.
    pub fn value(&mut self, value: &Value) -> &mut Self {
        if self.inline() {
            value.write_literal(self.config.dialect, &mut self.sql);
            self
        } else {
            self.placeholder()
        }
    }

    /// Render a child node.
    pub fn visit<P: QueryPart + ?Sized>(&mut self, part: &P) -> &mut Self {
        part.render(self);
        self
    }

    /// Render a list of nodes separated by `sep`.
    pub fn visit_list<'p, P, I>(&mut self, parts: I, sep: &str) -> &mut Self
    where
        P: QueryPart + 'p,
        I: IntoIterator<Item = &'p P>,
    {
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            part.render(self);
        }
        self
    }

    /// Render a child node wrapped in parentheses.
    pub fn visit_parenthesized<P: QueryPart + ?Sized>(&mut self, part: &P) -> &mut Self {
        self.sql.push('(');
        part.render(self);
        self.sql.push(')');
        self
    }

    /// Number of placeholders emitted so far.
    pub fn placeholder_count(&self) -> usize {
        self.next_param - 1
    }

    /// The SQL rendered so far.
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Finish rendering and return the SQL text.
    pub fn finish(self) -> String {
        self.sql
    }
}

/// Binding state: configuration, sink, mode flags and the next parameter index.
pub struct BindContext<'a> {
    config: Configuration,
    sink: &'a mut dyn BindSink,
    index: usize,
    scope: Scope,
}

impl<'a> BindContext<'a> {
    /// Create a context writing into `sink` from the 1-based `start` index.
    pub fn new(config: Configuration, sink: &'a mut dyn BindSink, start: usize) -> Self {
        Self {
            config,
            sink,
            index: start,
            scope: Scope::default(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Whether literals are rendered inline (and therefore never bound).
    pub fn inline(&self) -> bool {
        self.config.inline_parameters
    }

    /// The next parameter index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn declare_fields(&self) -> bool {
        self.scope.declare_fields
    }

    pub fn declare_tables(&self) -> bool {
        self.scope.declare_tables
    }

    /// Mirror of [`RenderContext::with_declare_fields`].
    pub fn with_declare_fields<R>(&mut self, on: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope.declare_fields = on;
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Mirror of [`RenderContext::with_declare_tables`].
    pub fn with_declare_tables<R>(&mut self, on: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope.declare_tables = on;
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Mirror of [`RenderContext::with_reference`].
    pub fn with_reference<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope = Scope::default();
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Bind one value at the current index and advance.
    ///
    /// In inline mode the value was rendered as a literal, so nothing is bound.
    pub fn value(&mut self, value: &Value) -> SqlResult<()> {
        if self.inline() {
            return Ok(());
        }
        self.sink.bind_value(self.index, value)?;
        self.index += 1;
        Ok(())
    }

    /// Bind a child node.
    pub fn visit<P: QueryPart + ?Sized>(&mut self, part: &P) -> SqlResult<()> {
        part.bind(self)
    }

    /// Bind a list of nodes in order.
    pub fn visit_list<'p, P, I>(&mut self, parts: I) -> SqlResult<()>
    where
        P: QueryPart + 'p,
        I: IntoIterator<Item = &'p P>,
    {
        for part in parts {
            part.bind(self)?;
        }
        Ok(())
    }
}

/// An ordered, 1-indexed positional value sink (a prepared statement).
pub trait BindSink {
    /// Write `value` at the 1-based parameter `index`.
    fn bind_value(&mut self, index: usize, value: &Value) -> SqlResult<()>;

    fn set_null(&mut self, index: usize) -> SqlResult<()> {
        self.bind_value(index, &Value::Null)
    }

    fn set_bool(&mut self, index: usize, value: bool) -> SqlResult<()> {
        self.bind_value(index, &Value::Bool(value))
    }

    fn set_i32(&mut self, index: usize, value: i32) -> SqlResult<()> {
        self.bind_value(index, &Value::Int(value))
    }

    fn set_i64(&mut self, index: usize, value: i64) -> SqlResult<()> {
        self.bind_value(index, &Value::BigInt(value))
    }

    fn set_f64(&mut self, index: usize, value: f64) -> SqlResult<()> {
        self.bind_value(index, &Value::Double(value))
    }

    fn set_string(&mut self, index: usize, value: &str) -> SqlResult<()> {
        self.bind_value(index, &Value::Text(value.to_string()))
    }
}

/// A collecting sink whose contents can be passed to `tokio-postgres`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get the value at a 1-based index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.params.get(i))
    }

    /// All values in parameter order.
    pub fn values(&self) -> &[Value] {
        &self.params
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    /// Clear all parameters.
    pub fn clear(&mut self) {
        self.params.clear();
    }
}

impl BindSink for ParamList {
    fn bind_value(&mut self, index: usize, value: &Value) -> SqlResult<()> {
        match index {
            0 => Err(SqlError::bind(index, "parameter indices are 1-based")),
            i if i <= self.params.len() => {
                self.params[i - 1] = value.clone();
                Ok(())
            }
            i if i == self.params.len() + 1 => {
                self.params.push(value.clone());
                Ok(())
            }
            i => Err(SqlError::bind(
                i,
                format!("no value bound at index {}", self.params.len() + 1),
            )),
        }
    }
}
