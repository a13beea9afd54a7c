//! Per-table statement templates
//!
//! Insert, update and delete text only depends on the table schema, so it is
//! rendered once per schema version and reused for every generated value.

use crate::query::{DeleteBuilder, InsertBuilder, Query, Relation, UpdateBuilder};
use crate::schema::TableSchema;
use crate::typedef::{ColumnType, StatementCacheType, StatementType, StmtCache};

pub(crate) fn build_stmt_cache(
    keyspace: &str,
    table: &str,
    t: &TableSchema,
    kind: StatementCacheType,
) -> StmtCache {
    let qualified = format!("{keyspace}.{table}");
    match kind {
        StatementCacheType::Insert => insert_cache(&qualified, t, false),
        StatementCacheType::InsertIfNotExists => insert_cache(&qualified, t, true),
        StatementCacheType::Update => update_cache(&qualified, t),
        StatementCacheType::Delete => delete_cache(&qualified, t),
    }
}

/// Template for `kind`, rendered on the spot if the table has none cached
pub(crate) fn cached(keyspace: &str, table: &str, t: &TableSchema, kind: StatementCacheType) -> StmtCache {
    match t.stmt_cache(kind) {
        Some(cache) => cache.clone(),
        None => build_stmt_cache(keyspace, table, t, kind),
    }
}

fn insert_cache(qualified: &str, t: &TableSchema, unique: bool) -> StmtCache {
    let mut builder = InsertBuilder::new(qualified);
    let mut types = Vec::new();
    for pk in t.partition_keys.iter().chain(&t.clustering_keys) {
        builder = builder.column(&pk.name);
        types.push(pk.column_type.clone());
    }
    for c in &t.columns {
        builder = match &c.column_type {
            ColumnType::Tuple(tuple) => builder.tuple_column(&c.name, tuple.types.len()),
            ColumnType::Simple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => {
                builder.column(&c.name)
            }
        };
        types.push(c.column_type.clone());
    }
    if unique {
        builder = builder.unique();
    }
    StmtCache {
        query: Query::Insert(builder),
        len_value: len_value(&types),
        types,
        query_type: StatementType::Insert,
    }
}

/// Bound order is regular columns, then partition keys, then clustering keys
fn update_cache(qualified: &str, t: &TableSchema) -> StmtCache {
    let mut builder = UpdateBuilder::new(qualified);
    let mut types = Vec::new();
    for c in &t.columns {
        builder = match &c.column_type {
            ColumnType::Counter(_) => builder.set_lit(&c.name, format!("{}+1", c.name)),
            ColumnType::Tuple(tuple) => builder.set_tuple(&c.name, tuple.types.len()),
            ColumnType::Simple(_) | ColumnType::Udt(_) => builder.set(&c.name),
        };
        if !c.column_type.is_counter() {
            types.push(c.column_type.clone());
        }
    }
    for k in t.partition_keys.iter().chain(&t.clustering_keys) {
        builder = builder.where_(Relation::eq(&k.name));
        types.push(k.column_type.clone());
    }
    StmtCache {
        query: Query::Update(builder),
        len_value: len_value(&types),
        types,
        query_type: StatementType::Update,
    }
}

fn delete_cache(qualified: &str, t: &TableSchema) -> StmtCache {
    let mut builder = DeleteBuilder::new(qualified);
    let mut types = Vec::new();
    for pk in &t.partition_keys {
        builder = builder.where_(Relation::eq(&pk.name));
        types.push(pk.column_type.clone());
    }
    if let Some(ck) = t.clustering_keys.first() {
        builder = builder
            .where_(Relation::gt_or_eq(&ck.name))
            .where_(Relation::lt_or_eq(&ck.name));
        types.push(ck.column_type.clone());
        types.push(ck.column_type.clone());
    }
    StmtCache {
        query: Query::Delete(builder),
        len_value: len_value(&types),
        types,
        query_type: StatementType::Delete,
    }
}

fn len_value(types: &[ColumnType]) -> usize {
    types.iter().map(ColumnType::len_value).sum()
}
