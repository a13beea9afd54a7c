//! Schema model and random schema synthesis
//!
//! A [`Schema`] is built once, either from [`gen_schema`] or by loading a
//! dumped JSON document, and afterwards only changes through applied
//! [`SchemaChange`]s.

pub mod column;
mod config;
mod ddl;
mod replication;
mod table;

pub use column::{ColumnDef, IndexDef, MaterializedView};
pub use config::{CqlFeature, PartitionRangeConfig, SchemaConfig};
pub use ddl::{ColumnChange, Confirmed, DdlProposal, Proposed, SchemaChange};
pub use replication::Replication;
pub use table::{KnownIssue, Table, TableSchema};

use crate::error::SchemaConfigError;
use column::{
    create_indexes, create_materialized_views, gen_column_name, gen_column_type,
    gen_partition_key_column_type, gen_primary_key_column_type,
};
use crate::typedef::CounterType;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_KEYSPACE: &str = "ks1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    pub name: String,
    pub replication: Replication,
    pub oracle_replication: Replication,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Schema {
    pub keyspace: Keyspace,
    pub tables: Vec<Arc<Table>>,
}

impl Schema {
    /// Validate `sc` and synthesize a schema from it
    ///
    /// # Errors
    ///
    /// Returns the first invalid bound pair of the configuration.
    pub fn generate<R: Rng + ?Sized>(
        sc: &SchemaConfig,
        rng: &mut R,
    ) -> Result<Self, SchemaConfigError> {
        sc.validate()?;
        Ok(gen_schema(sc, rng))
    }

    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// `CREATE KEYSPACE` text for the system under test and the oracle
    pub fn create_keyspace_statements(&self) -> (String, String) {
        let ks = &self.keyspace;
        (
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = {}",
                ks.name,
                ks.replication.to_cql()
            ),
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = {}",
                ks.name,
                ks.oracle_replication.to_cql()
            ),
        )
    }

    /// Types, tables, indexes and views in creation order
    pub fn create_schema_statements(&self) -> Vec<String> {
        let ks = &self.keyspace.name;
        let mut stmts = Vec::new();
        for t in &self.tables {
            stmts.extend(t.create_types_statements(ks));
            stmts.push(t.create_table_statement(ks));
            stmts.extend(t.create_index_statements(ks));
            stmts.extend(t.create_materialized_view_statements(ks));
        }
        stmts
    }

    pub fn drop_schema_statements(&self) -> Vec<String> {
        vec![format!("DROP KEYSPACE IF EXISTS {}", self.keyspace.name)]
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load a dumped schema and rebuild its statement caches
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.rebuild_caches();
        Ok(schema)
    }

    fn rebuild_caches(&self) {
        for t in &self.tables {
            t.write().rebuild_caches(&self.keyspace.name, &t.name);
        }
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    keyspace: Option<Keyspace>,
    tables: Vec<Table>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyspace(mut self, keyspace: Keyspace) -> Self {
        self.keyspace = Some(keyspace);
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(self) -> Schema {
        let keyspace = self.keyspace.unwrap_or_else(|| Keyspace {
            name: DEFAULT_KEYSPACE.to_string(),
            replication: Replication::default(),
            oracle_replication: Replication::default(),
        });
        let schema = Schema {
            keyspace,
            tables: self.tables.into_iter().map(Arc::new).collect(),
        };
        schema.rebuild_caches();
        schema
    }
}

/// Synthesize between one and `max_tables` tables in keyspace `ks1`
///
/// `sc` is expected to be valid; see [`Schema::generate`].
pub fn gen_schema<R: Rng + ?Sized>(sc: &SchemaConfig, rng: &mut R) -> Schema {
    let mut builder = SchemaBuilder::new().keyspace(Keyspace {
        name: DEFAULT_KEYSPACE.to_string(),
        replication: sc.replication_strategy.clone(),
        oracle_replication: sc.oracle_replication_strategy.clone(),
    });
    let num_tables = 1 + rng.gen_range(0..sc.max_tables.max(1));
    for i in 0..num_tables {
        builder = builder.table(create_table(sc, &format!("table{}", i + 1), rng));
    }
    let schema = builder.build();
    log::info!(
        "generated schema for keyspace {} with {} table(s)",
        schema.keyspace.name,
        schema.tables.len()
    );
    schema
}

/// Synthesize one table
///
/// Counter tables get exactly one counter column and never carry indexes or
/// views. Other tables get indexes when the feature level is above `basic`,
/// and a materialized view when they also have clustering keys.
pub fn create_table<R: Rng + ?Sized>(sc: &SchemaConfig, name: &str, rng: &mut R) -> Table {
    let num_partition_keys = range(rng, sc.min_partition_keys, sc.max_partition_keys).max(1);
    let partition_keys: Vec<ColumnDef> = (0..num_partition_keys)
        .map(|i| ColumnDef::new(gen_column_name("pk", i), gen_partition_key_column_type(rng)))
        .collect();
    let num_clustering_keys = range(rng, sc.min_clustering_keys, sc.max_clustering_keys);
    let clustering_keys: Vec<ColumnDef> = (0..num_clustering_keys)
        .map(|i| ColumnDef::new(gen_column_name("ck", i), gen_primary_key_column_type(rng)))
        .collect();

    let mut schema = TableSchema {
        table_options: sc.table_options.clone(),
        ..TableSchema::default()
    };

    if sc.use_counters {
        schema.columns = vec![ColumnDef::new(
            gen_column_name("col", 0),
            crate::typedef::ColumnType::Counter(CounterType),
        )];
    } else {
        let num_columns = range(rng, sc.min_columns, sc.max_columns);
        let columns: Vec<ColumnDef> = (0..num_columns)
            .map(|i| ColumnDef::new(gen_column_name("col", i), gen_column_type(rng, num_columns, sc)))
            .collect();
        if sc.cql_feature > CqlFeature::Basic && num_columns > 0 {
            let num_indexes = rng.gen_range(1..num_columns.max(2));
            schema.indexes = create_indexes(&columns, name, num_indexes);
        }
        if sc.cql_feature > CqlFeature::Basic && num_clustering_keys > 0 {
            schema.materialized_views = create_materialized_views(
                rng,
                &columns,
                name,
                &partition_keys,
                &clustering_keys,
            );
        }
        schema.columns = columns;
    }

    schema.partition_keys = partition_keys;
    schema.clustering_keys = clustering_keys;
    log::debug!(
        "table {name}: {} partition key(s), {} clustering key(s), {} column(s), {} index(es), {} view(s)",
        schema.partition_keys.len(),
        schema.clustering_keys.len(),
        schema.columns.len(),
        schema.indexes.len(),
        schema.materialized_views.len()
    );
    Table::new(name, schema)
}

/// Uniform draw from `[min, max)`, or `min` for an empty range
fn range<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_rejects_invalid_config() {
        let sc = SchemaConfig {
            max_columns: 2,
            min_columns: 2,
            ..SchemaConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Schema::generate(&sc, &mut rng).unwrap_err(),
            SchemaConfigError::InvalidColumns
        );
    }

    #[test]
    fn test_table_shape_within_bounds() {
        let sc = SchemaConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        for i in 0..50 {
            let t = create_table(&sc, &format!("t{i}"), &mut rng);
            let s = t.read();
            assert!((1..4).contains(&s.partition_keys.len()));
            assert!(s.clustering_keys.len() < 4);
            assert!((1..8).contains(&s.columns.len()));
            assert!(s.partition_keys.iter().all(|c| c.column_type.is_key_eligible()));
            assert!(s.clustering_keys.iter().all(|c| c.column_type.is_key_eligible()));
        }
    }

    #[test]
    fn test_counter_tables() {
        let sc = SchemaConfig {
            use_counters: true,
            ..SchemaConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let t = create_table(&sc, "table1", &mut rng);
        let s = t.read();
        assert!(s.is_counter_table());
        assert!(s.indexes.is_empty());
        assert!(s.materialized_views.is_empty());
    }

    #[test]
    fn test_create_schema_statement_order() {
        let sc = SchemaConfig {
            cql_feature: CqlFeature::All,
            min_clustering_keys: 1,
            ..SchemaConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let schema = gen_schema(&sc, &mut rng);
        let stmts = schema.create_schema_statements();
        let table_pos = stmts
            .iter()
            .position(|s| s.starts_with("CREATE TABLE"))
            .unwrap();
        assert!(stmts[..table_pos]
            .iter()
            .all(|s| s.starts_with("CREATE TYPE")));
        assert!(stmts[table_pos + 1..]
            .iter()
            .all(|s| !s.starts_with("CREATE TYPE")));
    }

    #[test]
    fn test_keyspace_statements() {
        let schema = SchemaBuilder::new().build();
        let (test, oracle) = schema.create_keyspace_statements();
        assert_eq!(
            test,
            "CREATE KEYSPACE IF NOT EXISTS ks1 WITH REPLICATION = {'class':'SimpleStrategy','replication_factor':1}"
        );
        assert_eq!(test, oracle);
        assert_eq!(
            schema.drop_schema_statements(),
            vec!["DROP KEYSPACE IF EXISTS ks1"]
        );
    }

    #[test]
    fn test_json_dump_and_load() {
        let mut rng = StdRng::seed_from_u64(5);
        let schema = gen_schema(&SchemaConfig::default(), &mut rng);
        let json = schema.to_json().unwrap();
        let loaded = Schema::from_json(&json).unwrap();
        assert_eq!(loaded.keyspace, schema.keyspace);
        assert_eq!(
            loaded.create_schema_statements(),
            schema.create_schema_statements()
        );
        let t = loaded.tables[0].read();
        assert!(t
            .stmt_cache(crate::typedef::StatementCacheType::Insert)
            .is_some());
    }
}
