//! Executor behavior against an in-memory client.
//!
//! The client records every statement it receives and returns no rows, so
//! these tests cover rendering, binding and listener plumbing without a
//! database.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlweave::prelude::*;
use sqlweave::{
    CompositeListener, ExecuteContext, ExecuteListener, ExecuteOutcome, QueryType, StatsListener,
};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Default)]
struct RecordingClient {
    calls: Mutex<Vec<(String, usize)>>,
    affected: u64,
}

impl RecordingClient {
    fn affecting(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SqlResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SqlResult<u64> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        Ok(self.affected)
    }
}

#[derive(Default)]
struct Captured {
    started: Mutex<Vec<String>>,
    completed: Mutex<Vec<(QueryType, ExecuteOutcome)>>,
}

impl ExecuteListener for Captured {
    fn on_start(&self, ctx: &ExecuteContext) {
        self.started.lock().unwrap().push(ctx.sql.clone());
    }

    fn on_complete(&self, ctx: &ExecuteContext, _duration: Duration, outcome: &ExecuteOutcome) {
        self.completed
            .lock()
            .unwrap()
            .push((ctx.query_type, outcome.clone()));
    }
}

fn users() -> (Table, Field<i32>, Field<String>) {
    let t = Table::new("users");
    let id = t.field("id");
    let name = t.field("name");
    (t, id, name)
}

#[tokio::test]
async fn insert_runs_with_postgres_placeholders() {
    let (t, id, name) = users();
    let executor = Executor::new(RecordingClient::affecting(1));

    let mut q = insert_into(&t);
    q.add_value(&id, 7).add_value(&name, "alice");
    assert_eq!(q.execute(&executor).await.unwrap(), 1);

    assert_eq!(
        executor.client().calls(),
        vec![(
            "insert into users (id, name) values ($1, $2)".to_string(),
            2
        )]
    );
}

#[tokio::test]
async fn empty_insert_never_reaches_the_client() {
    let (t, _, _) = users();
    let executor = Executor::new(RecordingClient::default());

    let err = insert_into(&t).execute(&executor).await.unwrap_err();
    assert!(err.is_empty_statement());
    assert!(executor.client().calls().is_empty());
}

#[tokio::test]
async fn select_execute_keeps_its_result() {
    let (t, id, _) = users();
    let executor = Executor::new(RecordingClient::default());

    let mut q = select_from(&t);
    q.add_conditions(id.gt(10));
    assert!(q.result().is_none());

    assert_eq!(q.execute(&executor).await.unwrap(), 0);
    assert_eq!(q.result().map(<[Record]>::len), Some(0));
    assert_eq!(
        executor.client().calls(),
        vec![("select * from users where users.id > $1".to_string(), 1)]
    );
}

#[tokio::test]
async fn fetch_one_on_no_rows_is_not_found() {
    let (t, id, _) = users();
    let executor = Executor::new(RecordingClient::default());

    let mut q = select_from(&t);
    q.add_conditions(id.eq(1));
    let err = executor.fetch_one(&q).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(executor.fetch_optional(&q).await.unwrap().is_none());
}

#[tokio::test]
async fn listeners_observe_every_statement() {
    let (t, id, name) = users();
    let captured = Arc::new(Captured::default());
    let stats = Arc::new(StatsListener::new());
    let composite = CompositeListener::new()
        .add_arc(captured.clone())
        .add_arc(stats.clone());
    let executor =
        Executor::new(RecordingClient::affecting(3)).with_listener(composite);

    let mut upd = update(&t);
    upd.add_value(&name, "bob").add_conditions(id.lt(5));
    upd.execute(&executor).await.unwrap();

    let mut del = delete_from(&t);
    del.add_conditions(name.is_null());
    del.execute(&executor).await.unwrap();

    select_from(&t).fetch(&executor).await.unwrap();

    assert_eq!(
        *captured.started.lock().unwrap(),
        vec![
            "update users set name = $1 where users.id < $2".to_string(),
            "delete from users where users.name is null".to_string(),
            "select * from users".to_string(),
        ]
    );
    assert_eq!(
        *captured.completed.lock().unwrap(),
        vec![
            (QueryType::Update, ExecuteOutcome::Affected(3)),
            (QueryType::Delete, ExecuteOutcome::Affected(3)),
            (QueryType::Select, ExecuteOutcome::Rows(0)),
        ]
    );

    let s = stats.stats();
    assert_eq!(s.total, 3);
    assert_eq!(s.failed, 0);
    assert_eq!(s.update_count, 1);
    assert_eq!(s.delete_count, 1);
    assert_eq!(s.select_count, 1);
    assert_eq!(s.params_bound, 2);
}

#[tokio::test]
async fn executor_honours_its_configuration() {
    let (t, id, name) = users();

    let mut q = select([name.clone().into()]);
    q.add_from(&t).add_conditions(id.eq(2));

    let mysql = Executor::new(RecordingClient::default())
        .with_config(Configuration::new(Dialect::MySql));
    let prepared = mysql.prepare(&q).unwrap();
    assert_eq!(prepared.sql, "select users.name from users where users.id = ?");
    assert_eq!(prepared.params.values(), &[Value::Int(2)]);

    let inline = Executor::new(RecordingClient::default())
        .with_config(Configuration::new(Dialect::Postgres).inline());
    let prepared = inline.prepare(&q).unwrap();
    assert_eq!(prepared.sql, "select users.name from users where users.id = 2");
    assert!(prepared.params.is_empty());
}

#[tokio::test]
async fn borrowed_clients_are_clients() {
    let (t, id, _) = users();
    let client = RecordingClient::affecting(4);
    {
        let executor = Executor::new(&client);
        let mut q = delete_from(&t);
        q.add_conditions(id.ge(100));
        assert_eq!(q.execute(&executor).await.unwrap(), 4);
    }
    assert_eq!(client.calls().len(), 1);
}
