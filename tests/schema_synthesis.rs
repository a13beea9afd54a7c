use cql_twin::error::SchemaConfigError;
use cql_twin::schema::{CqlFeature, Schema, SchemaConfig};
use cql_twin::typedef::ColumnType;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;

fn config(feature: CqlFeature) -> SchemaConfig {
    SchemaConfig {
        max_tables: 4,
        cql_feature: feature,
        ..SchemaConfig::default()
    }
}

#[test]
fn test_basic_feature_has_no_indexes_or_views() {
    let sc = config(CqlFeature::Basic);
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        let schema = Schema::generate(&sc, &mut rng).unwrap();
        for t in &schema.tables {
            let t = t.read();
            assert!(t.indexes.is_empty());
            assert!(t.materialized_views.is_empty());
            assert!(t
                .columns
                .iter()
                .all(|c| matches!(c.column_type, ColumnType::Simple(_))));
        }
    }
}

#[test]
fn test_generated_shape_within_bounds() {
    let sc = config(CqlFeature::All);
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        let schema = Schema::generate(&sc, &mut rng).unwrap();
        assert_eq!(schema.keyspace.name, "ks1");
        assert!((1..=sc.max_tables).contains(&schema.tables.len()));
        for (i, t) in schema.tables.iter().enumerate() {
            assert_eq!(t.name, format!("table{}", i + 1));
            let s = t.read();
            assert!((sc.min_partition_keys..sc.max_partition_keys).contains(&s.partition_keys.len()));
            assert!(s.clustering_keys.len() < sc.max_clustering_keys);
            assert!((sc.min_columns..sc.max_columns).contains(&s.columns.len()));
            assert!(s.partition_keys.iter().chain(&s.clustering_keys).all(|c| c.column_type.is_key_eligible()));
            for idx in &s.indexes {
                assert_eq!(s.columns[idx.column_idx].name, idx.column);
            }
        }
    }
}

#[test]
fn test_counter_tables_have_one_counter_column() {
    let sc = SchemaConfig {
        use_counters: true,
        ..config(CqlFeature::All)
    };
    let mut rng = StdRng::seed_from_u64(3);
    let schema = Schema::generate(&sc, &mut rng).unwrap();
    for t in &schema.tables {
        let s = t.read();
        assert!(s.is_counter_table());
        assert_eq!(s.columns.len(), 1);
        assert!(s.indexes.is_empty());
        assert!(s.materialized_views.is_empty());
    }
}

#[test]
fn test_create_statements_shape() {
    let create_table =
        Regex::new(r"^CREATE TABLE IF NOT EXISTS ks1\.table\d+ \(.+, PRIMARY KEY \(\(pk0(,pk\d+)*\)(, ck0(,ck\d+)*)?\)\)").unwrap();
    let create_index = Regex::new(r"^CREATE INDEX IF NOT EXISTS table\d+_col\d+_idx ON ks1\.table\d+ \(col\d+\)$").unwrap();
    let create_view = Regex::new(r"^CREATE MATERIALIZED VIEW IF NOT EXISTS ks1\.table\d+_mv_0 AS SELECT \* FROM ks1\.table\d+ WHERE .+ IS NOT NULL").unwrap();

    let sc = config(CqlFeature::All);
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let schema = Schema::generate(&sc, &mut rng).unwrap();
        for stmt in schema.create_schema_statements() {
            let known = stmt.starts_with("CREATE TYPE IF NOT EXISTS ks1.")
                || create_table.is_match(&stmt)
                || create_index.is_match(&stmt)
                || create_view.is_match(&stmt);
            assert!(known, "unexpected statement: {stmt}");
        }
    }
}

#[test]
fn test_keyspace_statements_per_cluster() {
    let mut rng = StdRng::seed_from_u64(1);
    let schema = Schema::generate(&SchemaConfig::default(), &mut rng).unwrap();
    let (test, oracle) = schema.create_keyspace_statements();
    let expected =
        "CREATE KEYSPACE IF NOT EXISTS ks1 WITH REPLICATION = {'class':'SimpleStrategy','replication_factor':1}";
    assert_eq!(test, expected);
    assert_eq!(oracle, expected);
    assert_eq!(schema.drop_schema_statements(), vec!["DROP KEYSPACE IF EXISTS ks1".to_string()]);
}

#[test]
fn test_json_dump_reloads() {
    let mut rng = StdRng::seed_from_u64(9);
    let schema = Schema::generate(&config(CqlFeature::All), &mut rng).unwrap();
    let json = schema.to_json().unwrap();
    let reloaded = Schema::from_json(&json).unwrap();

    assert_eq!(reloaded.create_schema_statements(), schema.create_schema_statements());
    for (a, b) in schema.tables.iter().zip(&reloaded.tables) {
        assert_eq!(a.read().next_column(), b.read().next_column());
        assert_eq!(
            a.read().stmt_cache(cql_twin::typedef::StatementCacheType::Insert),
            b.read().stmt_cache(cql_twin::typedef::StatementCacheType::Insert)
        );
    }
}

fn bounds() -> impl Strategy<Value = (usize, usize)> {
    (0usize..10, 0usize..10).prop_filter("max must not exceed min", |(max, min)| max <= min)
}

proptest! {
    #[test]
    fn prop_non_increasing_bounds_rejected((max, min) in bounds(), which in 0usize..5) {
        let mut sc = SchemaConfig::default();
        let expected = match which {
            0 => { sc.max_partition_keys = max; sc.min_partition_keys = min; SchemaConfigError::InvalidPartitionKeys }
            1 => { sc.max_clustering_keys = max; sc.min_clustering_keys = min; SchemaConfigError::InvalidClusteringKeys }
            2 => { sc.max_columns = max; sc.min_columns = min; SchemaConfigError::InvalidColumns }
            3 => { sc.max_string_length = max; sc.min_string_length = min; SchemaConfigError::InvalidStringLength }
            _ => { sc.max_blob_length = max; sc.min_blob_length = min; SchemaConfigError::InvalidBlobLength }
        };
        prop_assert_eq!(sc.validate(), Err(expected));
        let mut rng = StdRng::seed_from_u64(0);
        prop_assert_eq!(Schema::generate(&sc, &mut rng).unwrap_err(), expected);
    }

    #[test]
    fn prop_valid_bounds_generate(min_pk in 1usize..4, extra in 1usize..4, seed in any::<u64>()) {
        let sc = SchemaConfig {
            min_partition_keys: min_pk,
            max_partition_keys: min_pk + extra,
            ..SchemaConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let schema = Schema::generate(&sc, &mut rng).unwrap();
        let pks = schema.tables[0].read().partition_keys.len();
        prop_assert!(pks >= min_pk && pks < min_pk + extra);
    }
}
