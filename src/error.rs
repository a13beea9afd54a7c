//! Error types for configuration validation, DDL proposals and partition generators.

use std::fmt;

/// Invalid `SchemaConfig` bounds
///
/// Returned once by [`SchemaConfig::validate`](crate::schema::SchemaConfig::validate).
/// Any of these is fatal to starting a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaConfigError {
    /// `max_partition_keys <= min_partition_keys`
    InvalidPartitionKeys,
    /// `max_clustering_keys <= min_clustering_keys`
    InvalidClusteringKeys,
    /// `max_columns <= min_columns`
    InvalidColumns,
    /// `max_string_length <= min_string_length`
    InvalidStringLength,
    /// `max_blob_length <= min_blob_length`
    InvalidBlobLength,
    /// `max_tables == 0`
    InvalidMaxTables,
}

impl fmt::Display for SchemaConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaConfigError::InvalidPartitionKeys => write!(
                f,
                "max number of partition keys must be bigger than min number of partition keys"
            ),
            SchemaConfigError::InvalidClusteringKeys => write!(
                f,
                "max number of clustering keys must be bigger than min number of clustering keys"
            ),
            SchemaConfigError::InvalidColumns => {
                write!(f, "max number of columns must be bigger than min number of columns")
            }
            SchemaConfigError::InvalidStringLength => {
                write!(f, "max string length must be bigger than min string length")
            }
            SchemaConfigError::InvalidBlobLength => {
                write!(f, "max blob length must be bigger than min blob length")
            }
            SchemaConfigError::InvalidMaxTables => {
                write!(f, "max number of tables must be at least 1")
            }
        }
    }
}

impl std::error::Error for SchemaConfigError {}

/// A schema mutation that cannot be proposed or applied
///
/// Proposal errors mean the caller should pick a different mutation;
/// application errors mean the proposal must be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlError {
    /// The picked column is not a simple scalar type
    ComplexType { column: String },
    /// The picked simple column has no compatible replacement type
    NoCompatibleType { column: String },
    /// The table has no regular columns to operate on
    NoColumns { table: String },
    /// Counter tables never change shape
    CounterTable { table: String },
    /// Every regular column is referenced by an index or a materialized view
    NoDroppableColumn { table: String },
    /// The table changed between proposal and application
    StaleProposal {
        table: String,
        proposed: u64,
        current: u64,
    },
    /// The column targeted by a change no longer exists
    UnknownColumn { table: String, column: String },
    /// The change was proposed for a different table
    WrongTable { expected: String, actual: String },
}

impl fmt::Display for DdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdlError::ComplexType { column } => {
                write!(f, "complex type={column} cannot be altered")
            }
            DdlError::NoCompatibleType { column } => write!(
                f,
                "simple type={column} has no compatible types so it cannot be altered"
            ),
            DdlError::NoColumns { table } => {
                write!(f, "table {table} has no regular columns")
            }
            DdlError::CounterTable { table } => {
                write!(f, "counter table {table} does not support schema changes")
            }
            DdlError::NoDroppableColumn { table } => write!(
                f,
                "every column of table {table} is referenced by an index or a materialized view"
            ),
            DdlError::StaleProposal {
                table,
                proposed,
                current,
            } => write!(
                f,
                "schema change for table {table} was proposed against version {proposed} but the table is at version {current}"
            ),
            DdlError::UnknownColumn { table, column } => {
                write!(f, "column {column} does not exist in table {table}")
            }
            DdlError::WrongTable { expected, actual } => write!(
                f,
                "schema change proposed for table {actual} cannot be applied to table {expected}"
            ),
        }
    }
}

impl std::error::Error for DdlError {}

/// Partition generator failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorError {
    /// The fresh-value channel was closed by the producer
    Closed,
    /// Every value seen in `attempts` tries was already in flight
    TokenSpaceExhausted { attempts: usize },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Closed => write!(f, "partition value channel closed"),
            GeneratorError::TokenSpaceExhausted { attempts } => write!(
                f,
                "no partition token outside the in-flight set after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for GeneratorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_config_error_messages() {
        assert_eq!(
            SchemaConfigError::InvalidPartitionKeys.to_string(),
            "max number of partition keys must be bigger than min number of partition keys"
        );
        assert_eq!(
            SchemaConfigError::InvalidColumns.to_string(),
            "max number of columns must be bigger than min number of columns"
        );
    }

    #[test]
    fn test_ddl_error_mentions_column() {
        let err = DdlError::ComplexType {
            column: "col3".to_string(),
        };
        assert!(err.to_string().contains("col3"));
    }
}
