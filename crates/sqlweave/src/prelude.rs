//! Convenient imports for typical `sqlweave` usage.
//!
//! ```ignore
//! use sqlweave::prelude::*;
//! ```

pub use crate::functions::{count, val};
pub use crate::{
    Condition, Configuration, Dialect, Executor, Field, FromRow, GenericClient, JoinKind,
    Mutation, Query, Record, Select, SelectQuery, SqlError, SqlResult, Table, TracingListener,
    Value, delete_from, insert_into, select, select_from, update,
};
