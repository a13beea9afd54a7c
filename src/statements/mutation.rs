//! Insert, JSON insert, update and delete shapes

use super::cache::cached;
use crate::query::{InsertBuilder, Query};
use crate::schema::column::to_json_map;
use crate::schema::{ColumnDef, KnownIssue, PartitionRangeConfig, TableSchema};
use crate::typedef::{
    ColumnType, SimpleType, StatementCacheType, StatementType, Stmt, Value, ValueWithToken, Values,
};
use rand::Rng;

/// Table coordinates shared by every shape
pub(crate) struct Target<'a> {
    pub keyspace: &'a str,
    pub name: &'a str,
    pub schema: &'a TableSchema,
}

impl Target<'_> {
    fn qualified(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }
}

/// Insert, or an update for counter tables
pub(crate) fn gen_insert_stmt<R: Rng + ?Sized>(
    t: &Target<'_>,
    vs: ValueWithToken,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Stmt {
    if t.schema.is_counter_table() {
        return gen_update_stmt(t, vs, rng, p);
    }
    let kind = if p.use_lwt && rng.gen::<u32>() % 10 == 0 {
        StatementCacheType::InsertIfNotExists
    } else {
        StatementCacheType::Insert
    };
    let cache = cached(t.keyspace, t.name, t.schema, kind);

    let mut values = vs.value.clone();
    append_values(&mut values, &t.schema.clustering_keys, rng, p);
    append_values(&mut values, &t.schema.columns, rng, p);
    bound(cache.query, cache.query_type, values, cache.types, vs)
}

/// Whole row as one JSON document
///
/// Falls back to [`gen_insert_stmt`] for counter tables and for tables where
/// JSON encoding of tuples is a known issue.
pub(crate) fn gen_insert_json_stmt<R: Rng + ?Sized>(
    t: &Target<'_>,
    vs: ValueWithToken,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Stmt {
    if t.schema.is_counter_table() || t.schema.has_known_issue(KnownIssue::JsonWithTuples) {
        return gen_insert_stmt(t, vs, rng, p);
    }

    let mut doc = serde_json::Map::new();
    let mut rest: &[Value] = &vs.value;
    for pk in &t.schema.partition_keys {
        let take = pk.column_type.len_value().min(rest.len());
        let json = match &pk.column_type {
            ColumnType::Tuple(_) => {
                serde_json::Value::Array(rest[..take].iter().map(Value::to_json).collect())
            }
            ColumnType::Simple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => rest
                .first()
                .map(Value::to_json)
                .unwrap_or(serde_json::Value::Null),
        };
        doc.insert(pk.name.clone(), json);
        rest = &rest[take..];
    }
    let doc = to_json_map(&t.schema.clustering_keys, doc, rng, p);
    let doc = to_json_map(&t.schema.columns, doc, rng, p);

    let query = Query::Insert(InsertBuilder::new(t.qualified()).json());
    let values = vec![Value::Text(serde_json::Value::Object(doc).to_string())];
    bound(
        query,
        StatementType::InsertJson,
        values,
        vec![SimpleType::Text.into()],
        vs,
    )
}

/// Sets every regular column, counters through a `c=c+1` literal
pub(crate) fn gen_update_stmt<R: Rng + ?Sized>(
    t: &Target<'_>,
    vs: ValueWithToken,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Stmt {
    let cache = cached(t.keyspace, t.name, t.schema, StatementCacheType::Update);

    let mut values = Vec::with_capacity(cache.len_value);
    for c in &t.schema.columns {
        if !c.column_type.is_counter() {
            values.extend(c.column_type.gen_value(rng, p));
        }
    }
    values.extend(vs.value.iter().cloned());
    append_values(&mut values, &t.schema.clustering_keys, rng, p);
    bound(cache.query, cache.query_type, values, cache.types, vs)
}

/// Rows of one partition within a random first-clustering-key range
pub(crate) fn gen_delete_rows<R: Rng + ?Sized>(
    t: &Target<'_>,
    vs: ValueWithToken,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Stmt {
    let cache = cached(t.keyspace, t.name, t.schema, StatementCacheType::Delete);

    let mut values = vs.value.clone();
    if let Some(ck) = t.schema.clustering_keys.first() {
        values.extend(ck.column_type.gen_value(rng, p));
        values.extend(ck.column_type.gen_value(rng, p));
    }
    bound(cache.query, cache.query_type, values, cache.types, vs)
}

fn append_values<R: Rng + ?Sized>(
    values: &mut Values,
    columns: &[ColumnDef],
    rng: &mut R,
    p: &PartitionRangeConfig,
) {
    for c in columns {
        values.extend(c.column_type.gen_value(rng, p));
    }
}

/// Mutation statement owning the token of `vs`
fn bound(
    query: Query,
    query_type: StatementType,
    values: Values,
    types: Vec<ColumnType>,
    vs: ValueWithToken,
) -> Stmt {
    let mut stmt = Stmt::new(query, query_type).with_values(values, types);
    stmt.leased_tokens.push(vs.token);
    stmt.value_with_token = Some(vs);
    stmt
}
