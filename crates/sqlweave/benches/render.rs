use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::{Condition, Configuration, Dialect, Field, ParamList, Query, SelectQuery, Table};

/// select c0, c1, ... from t where c0 = ? and c1 = ? ...
fn build_select(n: usize) -> SelectQuery {
    let t = Table::new("t");
    let fields: Vec<Field<i64>> = (0..n).map(|i| t.field(format!("c{i}"))).collect();

    let mut q = SelectQuery::new();
    q.add_from(&t);
    for f in &fields {
        q.add_select(f);
    }
    q.add_conditions(Condition::combine(
        sqlweave::Operator::And,
        fields.iter().enumerate().map(|(i, f)| f.eq(i as i64)),
    ));
    q
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/to_sql");
    let cfg = Configuration::new(Dialect::Postgres);

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql(&cfg)));
        });
    }

    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/bind_values");
    let cfg = Configuration::new(Dialect::Postgres);

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| {
                let mut params = ParamList::new();
                black_box(q.bind_values(&cfg, &mut params, 1))
            });
        });
    }

    group.finish();
}

fn bench_inline(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/inline");
    let cfg = Configuration::new(Dialect::Postgres).inline();

    for n in [1, 10, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql(&cfg)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_bind, bench_inline);
criterion_main!(benches);
