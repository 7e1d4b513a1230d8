//! End-to-end checks against a real PostgreSQL server.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honoured).

use sqlweave::prelude::*;
use sqlweave::{StatsListener, functions};

async fn try_connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

struct People {
    t: Table,
    id: Field<i32>,
    name: Field<String>,
    age: Field<i32>,
}

fn people() -> People {
    let t = Table::new("sw_people");
    People {
        id: t.field("id"),
        name: t.field("name"),
        age: t.field("age"),
        t,
    }
}

#[derive(Debug, PartialEq)]
struct Person {
    id: i32,
    name: String,
}

impl FromRow for Person {
    fn from_record(record: &Record) -> SqlResult<Self> {
        let p = people();
        Ok(Self {
            id: record.get(&p.id)?,
            name: record.get(&p.name)?,
        })
    }
}

async fn seed(client: &tokio_postgres::Client) {
    client
        .batch_execute(
            "CREATE TEMP TABLE sw_people (id int PRIMARY KEY, name text NOT NULL, age int)",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_select_update_delete_round() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    seed(&client).await;

    let p = people();
    let stats = std::sync::Arc::new(StatsListener::new());
    let executor = Executor::new(client).with_listener_arc(stats.clone());

    for (id, name, age) in [(1, "ann", 30), (2, "bob", 40), (3, "cid", 50)] {
        let mut ins = insert_into(&p.t);
        ins.add_value(&p.id, id)
            .add_value(&p.name, name)
            .add_value(&p.age, age);
        assert_eq!(ins.execute(&executor).await.unwrap(), 1);
    }

    let mut q = select([p.id.clone().into(), p.name.clone().into()]);
    q.add_from(&p.t)
        .add_conditions(p.age.ge(40).or(p.name.eq("ann")))
        .add_order_by(p.id.desc());
    let rows: Vec<Person> = q.fetch_into(&executor).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Person { id: 3, name: "cid".into() },
            Person { id: 2, name: "bob".into() },
            Person { id: 1, name: "ann".into() },
        ]
    );

    let mut upd = update(&p.t);
    upd.add_value_field(&p.age, &p.age.add(1))
        .add_conditions(p.id.in_list([1, 2]));
    assert_eq!(upd.execute(&executor).await.unwrap(), 2);

    let mut del = delete_from(&p.t);
    del.add_conditions(p.age.gt(50));
    assert_eq!(del.execute(&executor).await.unwrap(), 0);

    let stats = stats.stats();
    assert_eq!(stats.insert_count, 3);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn subqueries_execute() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    seed(&client).await;
    client
        .batch_execute("INSERT INTO sw_people VALUES (1, 'ann', 30), (2, 'bob', 40)")
        .await
        .unwrap();

    let p = people();
    let executor = Executor::new(client);

    let mut adults = select([p.id.clone().into()]);
    adults.add_from(&p.t).add_conditions(p.age.ge(35));
    let mut q = select([p.id.clone().into()]);
    q.add_from(&p.t)
        .add_conditions(p.id.not_in_select(adults).unwrap())
        .add_order_by(&p.id);
    let ids: Vec<i32> = q
        .fetch(&executor)
        .await
        .unwrap()
        .iter()
        .map(|r| r.get(&p.id).unwrap())
        .collect();
    assert_eq!(ids, vec![1]);

    let mut oldest = select([p.age.max().into()]);
    oldest.add_from(&p.t);
    let mut q = select([p.name.clone().into()]);
    q.add_from(&p.t)
        .add_conditions(p.age.eq_field(&oldest.as_field().unwrap()));
    let record = executor.fetch_one(&q).await.unwrap();
    let name: String = record.get(&p.name).unwrap();
    assert_eq!(name, "bob");

    let mut total = select([functions::count().into()]);
    total.add_from(&p.t);
    let record = executor.fetch_one(&total).await.unwrap();
    assert_eq!(record.get_index::<i64>(0).unwrap(), 2);
}

#[tokio::test]
async fn driver_errors_surface_as_query_errors() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    seed(&client).await;

    let p = people();
    let executor = Executor::new(client);

    let mut ins = insert_into(&p.t);
    ins.add_value(&p.id, 1).add_value(&p.name, "ann");
    ins.execute(&executor).await.unwrap();
    let err = ins.execute(&executor).await.unwrap_err();
    assert_eq!(err.db_code(), Some("23505"));
}
