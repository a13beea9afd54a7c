use super::replication::Replication;
use crate::error::SchemaConfigError;
use serde::Deserialize;

/// CQL feature level; higher levels unlock more complex column types,
/// secondary indexes and materialized views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CqlFeature {
    Basic = 1,
    #[default]
    Normal,
    All,
}

/// Bounds consulted while synthesizing the schema
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_replication")]
    pub replication_strategy: Replication,
    #[serde(default = "default_replication")]
    pub oracle_replication_strategy: Replication,
    /// Raw `WITH` options, e.g. `compaction = {'class':'LeveledCompactionStrategy'}`
    #[serde(default)]
    pub table_options: Vec<String>,
    #[serde(default = "default_max_tables")]
    pub max_tables: usize,
    #[serde(default = "default_max_partition_keys")]
    pub max_partition_keys: usize,
    #[serde(default = "default_min_partition_keys")]
    pub min_partition_keys: usize,
    #[serde(default = "default_max_clustering_keys")]
    pub max_clustering_keys: usize,
    #[serde(default)]
    pub min_clustering_keys: usize,
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,
    #[serde(default = "default_min_columns")]
    pub min_columns: usize,
    #[serde(default = "default_max_parts")]
    pub max_udt_parts: usize,
    #[serde(default = "default_max_parts")]
    pub max_tuple_parts: usize,
    #[serde(default = "default_max_length")]
    pub max_blob_length: usize,
    #[serde(default = "default_min_length")]
    pub min_blob_length: usize,
    #[serde(default = "default_max_length")]
    pub max_string_length: usize,
    #[serde(default = "default_min_length")]
    pub min_string_length: usize,
    #[serde(default)]
    pub use_counters: bool,
    #[serde(default)]
    pub use_lwt: bool,
    #[serde(default)]
    pub cql_feature: CqlFeature,
}

fn default_replication() -> Replication {
    Replication::default()
}

fn default_max_tables() -> usize {
    1
}

fn default_max_partition_keys() -> usize {
    4
}

fn default_min_partition_keys() -> usize {
    1
}

fn default_max_clustering_keys() -> usize {
    4
}

fn default_max_columns() -> usize {
    8
}

fn default_min_columns() -> usize {
    1
}

fn default_max_parts() -> usize {
    20
}

fn default_max_length() -> usize {
    1000
}

fn default_min_length() -> usize {
    1
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            replication_strategy: default_replication(),
            oracle_replication_strategy: default_replication(),
            table_options: Vec::new(),
            max_tables: default_max_tables(),
            max_partition_keys: default_max_partition_keys(),
            min_partition_keys: default_min_partition_keys(),
            max_clustering_keys: default_max_clustering_keys(),
            min_clustering_keys: 0,
            max_columns: default_max_columns(),
            min_columns: default_min_columns(),
            max_udt_parts: default_max_parts(),
            max_tuple_parts: default_max_parts(),
            max_blob_length: default_max_length(),
            min_blob_length: default_min_length(),
            max_string_length: default_max_length(),
            min_string_length: default_min_length(),
            use_counters: false,
            use_lwt: false,
            cql_feature: CqlFeature::default(),
        }
    }
}

impl SchemaConfig {
    /// Check that every max bound is strictly greater than its min bound
    ///
    /// # Errors
    ///
    /// Returns the first violated bound pair.
    pub fn validate(&self) -> Result<(), SchemaConfigError> {
        if self.max_partition_keys <= self.min_partition_keys {
            return Err(SchemaConfigError::InvalidPartitionKeys);
        }
        if self.max_clustering_keys <= self.min_clustering_keys {
            return Err(SchemaConfigError::InvalidClusteringKeys);
        }
        if self.max_columns <= self.min_columns {
            return Err(SchemaConfigError::InvalidColumns);
        }
        if self.max_string_length <= self.min_string_length {
            return Err(SchemaConfigError::InvalidStringLength);
        }
        if self.max_blob_length <= self.min_blob_length {
            return Err(SchemaConfigError::InvalidBlobLength);
        }
        if self.max_tables == 0 {
            return Err(SchemaConfigError::InvalidMaxTables);
        }
        Ok(())
    }

    /// Value-generation bounds derived from this configuration
    pub fn partition_range_config(&self) -> PartitionRangeConfig {
        PartitionRangeConfig {
            max_blob_length: self.max_blob_length,
            min_blob_length: self.min_blob_length,
            max_string_length: self.max_string_length,
            min_string_length: self.min_string_length,
            use_lwt: self.use_lwt,
        }
    }
}

/// Length bounds and LWT flag consulted by value generation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartitionRangeConfig {
    pub max_blob_length: usize,
    pub min_blob_length: usize,
    pub max_string_length: usize,
    pub min_string_length: usize,
    pub use_lwt: bool,
}

impl Default for PartitionRangeConfig {
    fn default() -> Self {
        SchemaConfig::default().partition_range_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(SchemaConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_equal_partition_key_bounds_rejected() {
        let sc = SchemaConfig {
            max_partition_keys: 2,
            min_partition_keys: 2,
            ..SchemaConfig::default()
        };
        assert_eq!(sc.validate(), Err(SchemaConfigError::InvalidPartitionKeys));
    }

    #[test]
    fn test_column_bounds_checked_against_min_columns() {
        let sc = SchemaConfig {
            max_columns: 3,
            min_columns: 5,
            min_clustering_keys: 0,
            ..SchemaConfig::default()
        };
        assert_eq!(sc.validate(), Err(SchemaConfigError::InvalidColumns));
    }

    #[test]
    fn test_clustering_bounds() {
        let sc = SchemaConfig {
            max_clustering_keys: 0,
            ..SchemaConfig::default()
        };
        assert_eq!(sc.validate(), Err(SchemaConfigError::InvalidClusteringKeys));
    }

    #[test]
    fn test_feature_ordering() {
        assert!(CqlFeature::Basic < CqlFeature::Normal);
        assert!(CqlFeature::Normal < CqlFeature::All);
    }

    #[test]
    fn test_deserialize_partial_section() {
        let cfg: SchemaConfig = serde_json::from_value(serde_json::json!({
            "max_tables": 3,
            "cql_feature": "basic",
            "use_lwt": true
        }))
        .unwrap();
        assert_eq!(cfg.max_tables, 3);
        assert_eq!(cfg.cql_feature, CqlFeature::Basic);
        assert!(cfg.partition_range_config().use_lwt);
        assert_eq!(cfg.max_columns, 8);
    }
}
