use cql_twin::generators::{Partition, RoutingKey, Shutdown};
use cql_twin::inflight::TokenSet;
use cql_twin::schema::{
    ColumnDef, MaterializedView, PartitionRangeConfig, Schema, SchemaBuilder, Table, TableSchema,
};
use cql_twin::statements::num_query_pks;
use cql_twin::typedef::{SimpleType, StatementType, Value, ValueWithToken};
use crossbeam_channel::{bounded, Sender};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use std::sync::Arc;

struct Source {
    values: Sender<ValueWithToken>,
    partition: Partition,
}

impl Source {
    fn new(capacity: usize) -> Self {
        let (values, rx) = bounded(capacity);
        let (wake_tx, _wake_rx) = bounded(1);
        let partition = Partition::new(
            rx,
            capacity,
            Arc::new(TokenSet::new()),
            wake_tx,
            Shutdown::new(),
        );
        Self { values, partition }
    }

    /// Queue `n` distinct single-key values
    fn fill(&self, n: i64) {
        let routing = RoutingKey::new(vec![SimpleType::BigInt.into()]);
        for i in 0..n {
            let value = vec![Value::BigInt(i)];
            let token = routing.token(&value);
            self.values.try_send(ValueWithToken::new(value, token)).unwrap();
        }
    }
}

fn columns(prefix: &str, n: usize, t: SimpleType) -> Vec<ColumnDef> {
    (0..n).map(|i| ColumnDef::new(format!("{prefix}{i}"), t)).collect()
}

fn schema_of(table: TableSchema) -> Schema {
    SchemaBuilder::new().table(Table::new("table1", table)).build()
}

fn plain_table(cks: usize, cols: usize) -> Schema {
    schema_of(TableSchema::new(
        columns("pk", 1, SimpleType::BigInt),
        columns("ck", cks, SimpleType::Int),
        columns("col", cols, SimpleType::Int),
    ))
}

fn placeholders(text: &str) -> usize {
    text.matches('?').count()
}

#[test]
fn test_update_binds_columns_then_keys() {
    let schema = plain_table(1, 2);
    let source = Source::new(4);
    source.fill(1);
    let mut rng = StdRng::seed_from_u64(1);
    let stmt = schema
        .gen_update_stmt(&schema.tables[0], &source.partition, &mut rng, &PartitionRangeConfig::default())
        .unwrap();

    assert_eq!(stmt.query_type, StatementType::Update);
    assert_eq!(
        stmt.to_cql().0,
        "UPDATE ks1.table1 SET col0=?,col1=? WHERE pk0=? AND ck0=?"
    );
    assert_eq!(stmt.values.len(), 4);
    assert_eq!(stmt.values[2], Value::BigInt(0));
    assert_eq!(stmt.leased_tokens, vec![stmt.value_with_token.as_ref().unwrap().token]);
}

#[test]
fn test_lwt_inserts_are_occasional() {
    let schema = plain_table(1, 1);
    let source = Source::new(256);
    source.fill(200);
    let mut rng = StdRng::seed_from_u64(2);
    let p = PartitionRangeConfig {
        use_lwt: true,
        ..PartitionRangeConfig::default()
    };
    let lwt = (0..200)
        .map(|_| {
            schema
                .gen_mutate_stmt(&schema.tables[0], &source.partition, &mut rng, &p, false)
                .unwrap()
        })
        .filter(|s| s.to_cql().0.ends_with(" IF NOT EXISTS"))
        .count();
    assert!(lwt > 0 && lwt < 60, "lwt inserts: {lwt}");
}

#[test]
fn test_deletes_and_json_inserts_are_mixed_in() {
    let schema = plain_table(1, 2);
    let source = Source::new(4096);
    source.fill(4000);
    let mut rng = StdRng::seed_from_u64(3);
    let p = PartitionRangeConfig::default();
    let delete = Regex::new(r"^DELETE FROM ks1\.table1 WHERE pk0=\? AND ck0>=\? AND ck0<=\?$").unwrap();

    let mut json = 0;
    let mut deletes = 0;
    for _ in 0..4000 {
        let stmt = schema
            .gen_mutate_stmt(&schema.tables[0], &source.partition, &mut rng, &p, true)
            .unwrap();
        match stmt.query_type {
            StatementType::InsertJson => {
                json += 1;
                assert_eq!(stmt.to_cql().0, "INSERT INTO ks1.table1 JSON ?");
                let Value::Text(doc) = &stmt.values[0] else {
                    panic!("JSON document must be bound as text");
                };
                let doc: serde_json::Value = serde_json::from_str(doc).unwrap();
                for name in ["pk0", "ck0", "col0", "col1"] {
                    assert!(doc.get(name).is_some(), "{name} missing from {doc}");
                }
            }
            StatementType::Delete => {
                deletes += 1;
                assert!(delete.is_match(&stmt.to_cql().0));
                assert_eq!(stmt.values.len(), 3);
            }
            StatementType::Insert => {}
            other => panic!("unexpected mutation {other:?}"),
        }
    }
    assert!(json > 1500 && json < 2500, "json inserts: {json}");
    assert!(deletes < 40, "deletes: {deletes}");
}

#[test]
fn test_view_reads_are_tagged() {
    let mut table = TableSchema::new(
        columns("pk", 1, SimpleType::BigInt),
        columns("ck", 1, SimpleType::Int),
        columns("col", 2, SimpleType::Int),
    );
    let col0 = table.columns[0].clone();
    table.materialized_views = vec![MaterializedView {
        name: "table1_mv_0".to_string(),
        partition_keys: vec![col0.clone(), table.partition_keys[0].clone()],
        clustering_keys: table.clustering_keys.clone(),
        non_primary_key: Some(col0),
    }];
    let schema = schema_of(table);
    let source = Source::new(512);
    source.fill(500);
    let mut rng = StdRng::seed_from_u64(4);
    let p = PartitionRangeConfig::default();

    let mut views = 0;
    for _ in 0..200 {
        let stmt = schema
            .gen_check_stmt(&schema.tables[0], &source.partition, &mut rng, &p)
            .unwrap();
        for token in &stmt.leased_tokens {
            source.partition.in_flight().delete(*token);
        }
        let text = stmt.to_cql().0;
        if text.starts_with("SELECT * FROM ks1.table1_mv_0 ") {
            views += 1;
            assert_eq!(stmt.query_type, StatementType::SelectFromMaterializedView);
            assert!(text.starts_with("SELECT * FROM ks1.table1_mv_0 WHERE col0"));
        } else {
            assert_ne!(stmt.query_type, StatementType::SelectFromMaterializedView);
        }
        assert_eq!(placeholders(&text), stmt.values.len());
    }
    assert!(views > 50 && views < 150, "view reads: {views}");
}

#[test]
fn test_clustering_range_reads() {
    let schema = plain_table(3, 1);
    let source = Source::new(512);
    source.fill(500);
    let mut rng = StdRng::seed_from_u64(5);
    let p = PartitionRangeConfig::default();
    let range = Regex::new(r"^SELECT \* FROM ks1\.table1 WHERE pk0(=\?| IN \(\?\)) (AND ck\d=\? )*AND (ck\d)>\? AND (ck\d)<\?$").unwrap();

    let mut seen = 0;
    for _ in 0..200 {
        let stmt = schema
            .gen_check_stmt(&schema.tables[0], &source.partition, &mut rng, &p)
            .unwrap();
        for token in &stmt.leased_tokens {
            source.partition.in_flight().delete(*token);
        }
        if stmt.query_type != StatementType::SelectRange {
            continue;
        }
        seen += 1;
        let text = stmt.to_cql().0;
        let caps = range.captures(&text).unwrap_or_else(|| panic!("bad range read: {text}"));
        assert_eq!(&caps[3], &caps[4]);
        assert_eq!(placeholders(&text), stmt.values.len());
    }
    assert!(seen > 0);
}

#[test]
fn test_closed_source_yields_nothing() {
    let schema = plain_table(1, 1);
    let Source { values, partition } = Source::new(1);
    drop(values);
    let mut rng = StdRng::seed_from_u64(6);
    let p = PartitionRangeConfig::default();
    let table = &schema.tables[0];
    assert!(schema.gen_mutate_stmt(table, &partition, &mut rng, &p, true).is_none());
    assert!(schema.gen_update_stmt(table, &partition, &mut rng, &p).is_none());
    for _ in 0..20 {
        assert!(schema.gen_check_stmt(table, &partition, &mut rng, &p).is_none());
    }
}

#[test]
fn test_cancelled_multi_partition_read_releases_leases() {
    let schema = schema_of(TableSchema::new(
        columns("pk", 2, SimpleType::BigInt),
        columns("ck", 1, SimpleType::Int),
        columns("col", 1, SimpleType::Int),
    ));
    let table = &schema.tables[0];
    let routing = RoutingKey::new(vec![SimpleType::BigInt.into(), SimpleType::BigInt.into()]);
    let p = PartitionRangeConfig::default();

    let mut cancelled = 0;
    for seed in 0..100 {
        let Source { values, partition } = Source::new(4);
        let value = vec![Value::BigInt(1), Value::BigInt(2)];
        let token = routing.token(&value);
        values.try_send(ValueWithToken::new(value, token)).unwrap();
        drop(values);

        let mut rng = StdRng::seed_from_u64(seed);
        match schema.gen_check_stmt(table, &partition, &mut rng, &p) {
            // Multi-partition shapes need a second value and give up.
            None => {
                cancelled += 1;
                assert!(partition.in_flight().is_empty(), "seed {seed} leaked a token");
            }
            Some(stmt) => {
                assert_eq!(stmt.leased_tokens, vec![token]);
                assert!(partition.in_flight().contains(token));
            }
        }
    }
    assert!(cancelled > 0);
}

proptest! {
    #[test]
    fn prop_insert_binds_every_column(cks in 0usize..4, cols in 0usize..6, seed in any::<u64>()) {
        let schema = plain_table(cks, cols);
        let source = Source::new(1);
        source.fill(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let stmt = schema
            .gen_mutate_stmt(&schema.tables[0], &source.partition, &mut rng, &PartitionRangeConfig::default(), false)
            .unwrap();
        prop_assert_eq!(stmt.query_type, StatementType::Insert);
        prop_assert_eq!(stmt.values.len(), 1 + cks + cols);
        prop_assert_eq!(stmt.types.len(), 1 + cks + cols);
        prop_assert_eq!(placeholders(&stmt.to_cql().0), 1 + cks + cols);
    }

    #[test]
    fn prop_multi_partition_reads_stay_bounded(len in 0usize..12, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = num_query_pks(&mut rng, len);
        prop_assert!(n >= 1);
        prop_assert!(len == 0 || n == 1 || n < len);
        prop_assert!((n as u64).pow(len as u32) <= 100);
    }
}
