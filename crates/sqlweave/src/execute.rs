//! Statement execution: render, bind, notify listeners, run.

use std::sync::Arc;
use std::time::Instant;

use crate::client::GenericClient;
use crate::config::{Configuration, Dialect};
use crate::error::{SqlError, SqlResult};
use crate::listener::{ExecuteContext, ExecuteListener, ExecuteOutcome};
use crate::query::Query;
use crate::record::{FromRow, Record};
use crate::render::{BindContext, ParamList, RenderContext};

/// A client paired with the configuration statements are rendered in.
///
/// Defaults to PostgreSQL placeholder mode, matching the `tokio-postgres`
/// driver behind [`GenericClient`].
///
/// # Example
///
/// ```ignore
/// let executor = Executor::new(client).with_listener(TracingListener::new());
/// let mut q = select_from(&users);
/// q.add_conditions(id.eq(1));
/// q.execute(&executor).await?;
/// for record in q.result().unwrap_or_default() {
///     let name: String = record.get(&name)?;
/// }
/// ```
pub struct Executor<C> {
    client: C,
    config: Configuration,
    listener: Option<Arc<dyn ExecuteListener>>,
}

/// A rendered statement with its bound values.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub sql: String,
    pub params: ParamList,
}

impl<C: GenericClient> Executor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: Configuration::new(Dialect::Postgres),
            listener: None,
        }
    }

    /// Render statements with `config` instead of the PostgreSQL default.
    pub fn with_config(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    pub fn with_listener<L: ExecuteListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn with_listener_arc(mut self, listener: Arc<dyn ExecuteListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Validate, render and bind a statement without running it.
    ///
    /// Fails if the number of placeholders rendered and values bound differ.
    pub fn prepare<Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<Prepared> {
        query.validate()?;

        let mut ctx = RenderContext::new(self.config);
        query.render(&mut ctx);
        let placeholders = ctx.placeholder_count();
        let sql = ctx.finish();

        let mut params = ParamList::new();
        let mut bind = BindContext::new(self.config, &mut params, 1);
        query.bind(&mut bind)?;
        let bound = bind.index() - 1;

        if bound != placeholders {
            return Err(SqlError::bind(
                bound,
                format!("rendered {placeholders} placeholder(s) but bound {bound} value(s)"),
            ));
        }

        Ok(Prepared { sql, params })
    }

    /// Run a select and return its records.
    pub async fn fetch<Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<Vec<Record>> {
        let prepared = self.prepare(query)?;
        let ctx = self.context(query, &prepared);
        self.notify_start(&ctx);

        let start = Instant::now();
        let result = self
            .client
            .query(&prepared.sql, &prepared.params.as_refs())
            .await;
        let outcome = match &result {
            Ok(rows) => ExecuteOutcome::Rows(rows.len()),
            Err(e) => ExecuteOutcome::error(e.to_string()),
        };
        self.notify_complete(&ctx, start, &outcome);

        Ok(result?.into_iter().map(Record::new).collect())
    }

    /// Run a select and map each record to `T`.
    pub async fn fetch_into<T: FromRow, Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<Vec<T>> {
        let records = self.fetch(query).await?;
        records.iter().map(T::from_record).collect()
    }

    /// Run a select and return its first record, if any.
    pub async fn fetch_optional<Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<Option<Record>> {
        Ok(self.fetch(query).await?.into_iter().next())
    }

    /// Run a select that must return a record.
    pub async fn fetch_one<Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<Record> {
        self.fetch_optional(query)
            .await?
            .ok_or_else(|| SqlError::NotFound("expected one record, got none".into()))
    }

    /// Run a statement and return the affected row count.
    pub async fn execute<Q: Query + ?Sized>(&self, query: &Q) -> SqlResult<u64> {
        let prepared = self.prepare(query)?;
        let ctx = self.context(query, &prepared);
        self.notify_start(&ctx);

        let start = Instant::now();
        let result = self
            .client
            .execute(&prepared.sql, &prepared.params.as_refs())
            .await;
        let outcome = match &result {
            Ok(n) => ExecuteOutcome::Affected(*n),
            Err(e) => ExecuteOutcome::error(e.to_string()),
        };
        self.notify_complete(&ctx, start, &outcome);

        result
    }

    fn context<Q: Query + ?Sized>(&self, query: &Q, prepared: &Prepared) -> ExecuteContext {
        ExecuteContext {
            sql: prepared.sql.clone(),
            param_count: prepared.params.len(),
            query_type: query.query_type(),
            dialect: self.config.dialect,
        }
    }

    fn notify_start(&self, ctx: &ExecuteContext) {
        if let Some(listener) = &self.listener {
            listener.on_start(ctx);
        }
    }

    fn notify_complete(&self, ctx: &ExecuteContext, start: Instant, outcome: &ExecuteOutcome) {
        if let Some(listener) = &self.listener {
            listener.on_complete(ctx, start.elapsed(), outcome);
        }
    }
}
