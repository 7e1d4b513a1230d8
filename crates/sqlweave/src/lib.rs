//! # sqlweave
//!
//! A typed, composable SQL statement tree with a two-pass render + bind protocol.
//!
//! ## Features
//!
//! - **Typed expressions**: `Field<T>` only compares with values and fields of `T`
//! - **Two render modes**: inline literals for reading, placeholders for executing
//! - **Render/bind lockstep**: every node binds exactly the values it rendered placeholders for
//! - **Dialects**: identifier quoting, `?` vs `$n` placeholders, limit clauses, type lookup
//! - **Composable**: AND/OR/NOT, joins, derived tables, UNION-style set operations, subqueries
//! - **Execution**: run statements on a `tokio-postgres` client or transaction, with listeners
//!
//! ## Example
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let t = Table::new("T");
//! let id: Field<i32> = t.field("ID");
//! let name: Field<String> = t.field("NAME");
//!
//! let mut q = select_from(&t);
//! q.add_conditions(id.eq(1).or(name.like("A%")));
//!
//! assert_eq!(
//!     q.to_sql(&Configuration::default().inline())?,
//!     "select * from T where (T.ID = 1 or T.NAME like 'A%')"
//! );
//! assert_eq!(
//!     q.to_sql(&Configuration::new(Dialect::Postgres))?,
//!     "select * from T where (T.ID = $1 or T.NAME like $2)"
//! );
//!
//! // Execute against PostgreSQL
//! let executor = Executor::new(client).with_listener(TracingListener::new());
//! q.execute(&executor).await?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod execute;
pub mod field;
pub mod functions;
pub mod ident;
pub mod listener;
pub mod prelude;
pub mod query;
pub mod record;
pub mod render;
pub mod table;
pub mod value;

pub use client::GenericClient;
pub use condition::{Comparator, Condition, Operator, Quantifier};
pub use config::{Configuration, Dialect, ParseDialectError};
pub use dialect::{ArrayConvention, array_type_convention, limit_clause, resolve_type};
pub use error::{SqlError, SqlResult};
pub use execute::{Executor, Prepared};
pub use field::{ArithmeticOp, Expr, Field, SortField, SortOrder};
pub use ident::{IdentPart, Name, quote_identifier};
pub use listener::{
    CompositeListener, ExecuteContext, ExecuteListener, ExecuteOutcome, ExecuteStats, QueryType,
    StatsListener, TracingListener,
};
pub use query::{
    CombinedQuery, DeleteQuery, InsertQuery, Limit, Mutation, Query, Select, SelectQuery,
    SetOperator, UpdateQuery, delete_from, insert_into, select, select_from, update,
};
pub use record::{FromRow, Record};
pub use render::{BindContext, BindSink, ParamList, QueryPart, RenderContext, bind, render};
pub use table::{JoinKind, Table};
pub use value::{HostType, Numeric, SqlType, Value};
