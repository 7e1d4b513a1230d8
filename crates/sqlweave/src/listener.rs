//! Execute listeners: observe every statement an [`Executor`](crate::Executor) runs.
//!
//! - [`TracingListener`] emits one `tracing` event per statement.
//! - [`StatsListener`] accumulates counters.
//! - [`CompositeListener`] fans out to several listeners.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sqlweave::{CompositeListener, Executor, StatsListener, TracingListener};
//!
//! let stats = Arc::new(StatsListener::new());
//! let listener = CompositeListener::new()
//!     .add(TracingListener::new())
//!     .add_arc(stats.clone());
//! let executor = Executor::new(client).with_listener(listener);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::Level;

use crate::config::Dialect;

/// Maximum length of an error message kept in an [`ExecuteOutcome`].
const MAX_ERROR_LEN: usize = 512;

/// Statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// What a listener sees about one execution.
#[derive(Debug, Clone)]
pub struct ExecuteContext {
    /// The rendered SQL sent to the database.
    pub sql: String,
    /// Number of bound values.
    pub param_count: usize,
    pub query_type: QueryType,
    pub dialect: Dialect,
}

/// How an execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// A query returned rows.
    Rows(usize),
    /// A mutation affected rows.
    Affected(u64),
    /// Execution failed (message truncated to 512 bytes).
    Error(String),
}

impl ExecuteOutcome {
    /// Create an error outcome, truncating long messages.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        ExecuteOutcome::Error(format!(
            "{}{}",
            truncate_bytes(&msg, MAX_ERROR_LEN),
            if msg.len() > MAX_ERROR_LEN { "..." } else { "" }
        ))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecuteOutcome::Error(_))
    }
}

/// Observer of statement executions.
pub trait ExecuteListener: Send + Sync {
    /// Called after rendering and binding, before the statement is sent.
    fn on_start(&self, _ctx: &ExecuteContext) {}

    /// Called once the statement finished, successfully or not.
    fn on_complete(&self, ctx: &ExecuteContext, duration: Duration, outcome: &ExecuteOutcome);
}

/// Cut `s` to at most `max_bytes`, on a char boundary.
pub(crate) fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// A `tracing`-based listener that logs each executed statement.
///
/// Events use the `sqlweave.sql` target. Statements slower than
/// `slow_threshold` are additionally logged at `WARN`.
#[derive(Debug, Clone)]
pub struct TracingListener {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Duration above which a statement is reported as slow.
    pub slow_threshold: Option<Duration>,
}

impl Default for TracingListener {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_threshold: None,
        }
    }
}

impl TracingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Report statements slower than `threshold` at `WARN`.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl ExecuteListener for TracingListener {
    fn on_complete(&self, ctx: &ExecuteContext, duration: Duration, outcome: &ExecuteOutcome) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(&ctx.sql);
        let elapsed_ms = duration.as_secs_f64() * 1000.0;

        if let ExecuteOutcome::Error(error) = outcome {
            tracing::error!(
                target: "sqlweave.sql",
                query_type = ?ctx.query_type,
                dialect = %ctx.dialect,
                param_count = ctx.param_count,
                elapsed_ms,
                sql = %sql,
                error = %error,
                "statement failed"
            );
            return;
        }

        emit_at_level!(
            self.level,
            target: "sqlweave.sql",
            query_type = ?ctx.query_type,
            dialect = %ctx.dialect,
            param_count = ctx.param_count,
            elapsed_ms,
            outcome = ?outcome,
            sql = %sql,
        );

        if self.slow_threshold.is_some_and(|t| duration > t) {
            tracing::warn!(
                target: "sqlweave.sql",
                query_type = ?ctx.query_type,
                elapsed_ms,
                sql = %sql,
                "slow statement"
            );
        }
    }
}

/// A listener that accumulates execution statistics.
#[derive(Debug, Default)]
pub struct StatsListener {
    total: AtomicU64,
    failed: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    params_bound: AtomicU64,
}

/// Snapshot of [`StatsListener`] counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteStats {
    pub total: u64,
    pub failed: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// Total number of values bound across all statements.
    pub params_bound: u64,
}

impl StatsListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> ExecuteStats {
        ExecuteStats {
            total: self.total.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            params_bound: self.params_bound.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total,
            &self.failed,
            &self.total_duration_nanos,
            &self.max_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.params_bound,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl ExecuteListener for StatsListener {
    fn on_complete(&self, ctx: &ExecuteContext, duration: Duration, outcome: &ExecuteOutcome) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total.fetch_add(1, Ordering::Relaxed);
        let prev = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.params_bound
            .fetch_add(ctx.param_count as u64, Ordering::Relaxed);

        let counter = match ctx.query_type {
            QueryType::Select => &self.select_count,
            QueryType::Insert => &self.insert_count,
            QueryType::Update => &self.update_count,
            QueryType::Delete => &self.delete_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if outcome.is_error() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Fans out to several listeners, in insertion order.
#[derive(Default, Clone)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn ExecuteListener>>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<L: ExecuteListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Add a shared listener (e.g. a [`StatsListener`] the caller keeps reading).
    pub fn add_arc(mut self, listener: Arc<dyn ExecuteListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ExecuteListener for CompositeListener {
    fn on_start(&self, ctx: &ExecuteContext) {
        for listener in &self.listeners {
            listener.on_start(ctx);
        }
    }

    fn on_complete(&self, ctx: &ExecuteContext, duration: Duration, outcome: &ExecuteOutcome) {
        for listener in &self.listeners {
            listener.on_complete(ctx, duration, outcome);
        }
    }
}
