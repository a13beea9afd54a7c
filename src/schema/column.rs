//! Column, index and materialized-view definitions and their random synthesis

use super::config::{CqlFeature, SchemaConfig};
use super::PartitionRangeConfig;
use crate::typedef::{ColumnType, SimpleType, TupleType, UdtType};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub column: String,
    pub column_idx: usize,
}

/// Materialized view over a base table
///
/// The view's partition key is the optional non-primary-key column followed
/// by the base partition keys; clustering keys are the base clustering keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedView {
    pub name: String,
    pub partition_keys: Vec<ColumnDef>,
    pub clustering_keys: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_primary_key: Option<ColumnDef>,
}

pub fn gen_column_name(prefix: &str, idx: usize) -> String {
    format!("{prefix}{idx}")
}

pub fn gen_index_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_idx")
}

/// Type for a partition-key column
pub fn gen_partition_key_column_type<R: Rng + ?Sized>(rng: &mut R) -> ColumnType {
    ColumnType::Simple(pick(rng, &SimpleType::KEY_ELIGIBLE))
}

/// Type for a clustering-key column
pub fn gen_primary_key_column_type<R: Rng + ?Sized>(rng: &mut R) -> ColumnType {
    ColumnType::Simple(pick(rng, &SimpleType::KEY_ELIGIBLE))
}

/// Type for a regular column, gated by the configured feature level
///
/// Complex types are drawn with a fixed weight each, so tables with many
/// columns end up mostly scalar.
pub fn gen_column_type<R: Rng + ?Sized>(
    rng: &mut R,
    num_columns: usize,
    sc: &SchemaConfig,
) -> ColumnType {
    let n = rng.gen_range(0..num_columns + 2);
    if n == num_columns && sc.cql_feature >= CqlFeature::Normal {
        return gen_tuple_type(rng, sc);
    }
    if n == num_columns + 1 && sc.cql_feature >= CqlFeature::All {
        return gen_udt_type(rng, sc);
    }
    ColumnType::Simple(gen_simple_type(rng, sc))
}

pub fn gen_simple_type<R: Rng + ?Sized>(rng: &mut R, sc: &SchemaConfig) -> SimpleType {
    match sc.cql_feature {
        CqlFeature::Basic => pick(rng, &SimpleType::KEY_ELIGIBLE),
        CqlFeature::Normal | CqlFeature::All => pick(rng, &SimpleType::ALL),
    }
}

pub fn gen_tuple_type<R: Rng + ?Sized>(rng: &mut R, sc: &SchemaConfig) -> ColumnType {
    let n = rng.gen_range(0..sc.max_tuple_parts.max(1)).max(2);
    let types = (0..n).map(|_| gen_simple_type(rng, sc)).collect();
    ColumnType::Tuple(TupleType { types })
}

pub fn gen_udt_type<R: Rng + ?Sized>(rng: &mut R, sc: &SchemaConfig) -> ColumnType {
    let type_name = format!("udt_{}", rng.gen::<u32>());
    let n = rng.gen_range(0..sc.max_udt_parts.max(1)).max(2);
    let fields = (0..n)
        .map(|i| (format!("f{i}"), gen_simple_type(rng, sc)))
        .collect();
    ColumnType::Udt(UdtType { type_name, fields })
}

fn pick<R: Rng + ?Sized>(rng: &mut R, domain: &[SimpleType]) -> SimpleType {
    domain.choose(rng).copied().unwrap_or(SimpleType::Int)
}

pub fn names(columns: &[ColumnDef]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

/// Columns whose type may become part of a view's primary key
pub fn valid_columns_for_primary_key(columns: &[ColumnDef]) -> Vec<&ColumnDef> {
    columns
        .iter()
        .filter(|c| c.column_type.is_key_eligible())
        .collect()
}

/// Secondary indexes over the first `num_indexes` indexable columns
pub fn create_indexes(columns: &[ColumnDef], table: &str, num_indexes: usize) -> Vec<IndexDef> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.column_type.indexable())
        .take(num_indexes.min(columns.len()))
        .map(|(i, c)| IndexDef {
            name: gen_index_name(table, &c.name),
            column: c.name.clone(),
            column_idx: i,
        })
        .collect()
}

/// One materialized view keyed by a random key-eligible regular column
///
/// Returns no view when no regular column can join the primary key.
pub fn create_materialized_views<R: Rng + ?Sized>(
    rng: &mut R,
    columns: &[ColumnDef],
    table: &str,
    partition_keys: &[ColumnDef],
    clustering_keys: &[ColumnDef],
) -> Vec<MaterializedView> {
    let valid = valid_columns_for_primary_key(columns);
    let Some(col) = valid.choose(rng).map(|c| (*c).clone()) else {
        return Vec::new();
    };
    let mut view_keys = vec![col.clone()];
    view_keys.extend_from_slice(partition_keys);
    vec![MaterializedView {
        name: format!("{table}_mv_0"),
        partition_keys: view_keys,
        clustering_keys: clustering_keys.to_vec(),
        non_primary_key: Some(col),
    }]
}

/// Generate a value per column into a JSON document
pub fn to_json_map<R: Rng + ?Sized>(
    columns: &[ColumnDef],
    mut map: serde_json::Map<String, serde_json::Value>,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> serde_json::Map<String, serde_json::Value> {
    for column in columns {
        let values = column.column_type.gen_value(rng, p);
        let json = match &column.column_type {
            ColumnType::Tuple(_) => {
                serde_json::Value::Array(values.iter().map(|v| v.to_json()).collect())
            }
            ColumnType::Simple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => values
                .first()
                .map(|v| v.to_json())
                .unwrap_or(serde_json::Value::Null),
        };
        map.insert(column.name.clone(), json);
    }
    map
}

/// UDT definitions referenced by `columns`, keyed by type name
pub fn udt_types(columns: &[ColumnDef]) -> BTreeMap<String, &UdtType> {
    columns
        .iter()
        .filter_map(|c| match &c.column_type {
            ColumnType::Udt(u) => Some((u.type_name.clone(), u)),
            ColumnType::Simple(_) | ColumnType::Tuple(_) | ColumnType::Counter(_) => None,
        })
        .collect()
}
