//! Read shapes used to compare the two clusters
//!
//! Reads take their partition values from the recycle path so they target
//! partitions that were written before. About half of the partition reads go
//! to a materialized view when the table has one.

use super::mutation::Target;
use crate::generators::ValueSource;
use crate::query::{Query, Relation, SelectBuilder};
use crate::schema::{ColumnDef, MaterializedView, PartitionRangeConfig};
use crate::typedef::{ColumnType, StatementType, Stmt, Values};
use rand::seq::SliceRandom;
use rand::Rng;

/// Upper bound on the number of partitions one IN query may address
const MAX_QUERIED_PARTITIONS: u32 = 100;

/// Table or view a read is sent to
struct ReadTarget<'a> {
    name: &'a str,
    partition_keys: &'a [ColumnDef],
    clustering_keys: &'a [ColumnDef],
    /// Regular base column the view is additionally keyed by
    extra_key: Option<&'a ColumnDef>,
    from_view: bool,
}

impl<'a> ReadTarget<'a> {
    fn pick<R: Rng + ?Sized>(t: &'a Target<'a>, rng: &mut R) -> Self {
        let views = &t.schema.materialized_views;
        if !views.is_empty() && rng.gen::<u32>() % 2 == 0 {
            let mv: &MaterializedView = &views[rng.gen_range(0..views.len())];
            return Self {
                name: &mv.name,
                partition_keys: &mv.partition_keys,
                clustering_keys: &mv.clustering_keys,
                extra_key: mv.non_primary_key.as_ref(),
                from_view: true,
            };
        }
        Self {
            name: t.name,
            partition_keys: &t.schema.partition_keys,
            clustering_keys: &t.schema.clustering_keys,
            extra_key: None,
            from_view: false,
        }
    }

    fn query_type(&self, base: StatementType) -> StatementType {
        if self.from_view {
            StatementType::SelectFromMaterializedView
        } else {
            base
        }
    }
}

/// Accumulates relations, values and leased tokens of one read
struct ReadBuilder {
    table: String,
    relations: Vec<Relation>,
    allow_filtering: bool,
    values: Values,
    types: Vec<ColumnType>,
    leased_tokens: Vec<u64>,
}

impl ReadBuilder {
    fn new(keyspace: &str, name: &str) -> Self {
        Self {
            table: format!("{keyspace}.{name}"),
            relations: Vec::new(),
            allow_filtering: false,
            values: Vec::new(),
            types: Vec::new(),
            leased_tokens: Vec::new(),
        }
    }

    fn relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    fn generated<R: Rng + ?Sized>(&mut self, column: &ColumnDef, rng: &mut R, p: &PartitionRangeConfig) {
        self.values.extend(column.column_type.gen_value(rng, p));
        self.types.push(column.column_type.clone());
    }

    /// Equality on a random clustering prefix, then `>` and `<` on the next key
    fn clustering_range<R: Rng + ?Sized>(
        &mut self,
        clustering_keys: &[ColumnDef],
        rng: &mut R,
        p: &PartitionRangeConfig,
    ) {
        if clustering_keys.is_empty() {
            return;
        }
        let max_rels = rng.gen_range(0..clustering_keys.len());
        for ck in &clustering_keys[..max_rels] {
            self.relation(Relation::eq(&ck.name));
            self.generated(ck, rng, p);
        }
        let ck = &clustering_keys[max_rels];
        self.relation(Relation::gt(&ck.name));
        self.relation(Relation::lt(&ck.name));
        self.generated(ck, rng, p);
        self.generated(ck, rng, p);
    }

    /// IN lists over every partition key, sourced from recycled values
    ///
    /// Returns `false` if the generator shut down midway.
    fn partition_in_lists<G, R>(
        &mut self,
        partition_keys: &[ColumnDef],
        g: &G,
        rng: &mut R,
        p: &PartitionRangeConfig,
    ) -> bool
    where
        G: ValueSource + ?Sized,
        R: Rng + ?Sized,
    {
        let num_query_pks = num_query_pks(rng, partition_keys.len());
        for (i, pk) in partition_keys.iter().enumerate() {
            self.relation(Relation::in_tuple(&pk.name, num_query_pks));
            for _ in 0..num_query_pks {
                let old = g.get_old();
                self.leased_tokens.extend(old.leased_token());
                let Some(vs) = old.into_value() else {
                    return false;
                };
                // View-only leading keys are not part of the base value.
                let num_mv_keys = partition_keys.len().saturating_sub(vs.value.len());
                match i.checked_sub(num_mv_keys).and_then(|j| vs.value.get(j)) {
                    Some(v) => {
                        self.values.push(v.clone());
                        self.types.push(pk.column_type.clone());
                    }
                    None => self.generated(pk, rng, p),
                }
            }
        }
        true
    }

    fn build(self, query_type: StatementType) -> Stmt {
        let mut builder = self
            .relations
            .into_iter()
            .fold(SelectBuilder::new(self.table), SelectBuilder::where_);
        if self.allow_filtering {
            builder = builder.allow_filtering();
        }
        let mut stmt =
            Stmt::new(Query::Select(builder), query_type).with_values(self.values, self.types);
        stmt.leased_tokens = self.leased_tokens;
        stmt
    }

    /// Give back every token leased so far
    fn abandon<G: ValueSource + ?Sized>(self, g: &G) {
        for token in self.leased_tokens {
            g.release_token(token);
        }
    }
}

/// Values per IN list, clamped so the queried partition count stays bounded
///
/// Draws from `[0, len)` with zero promoted to one. Falls back to a single
/// value per key when `n^len` exceeds the bound.
pub fn num_query_pks<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    let mut n = if len > 0 { rng.gen_range(0..len) } else { 0 };
    if n == 0 {
        n = 1;
    }
    let multiplier = u32::try_from(n)
        .ok()
        .and_then(|n| n.checked_pow(u32::try_from(len).unwrap_or(u32::MAX)));
    match multiplier {
        Some(m) if m <= MAX_QUERIED_PARTITIONS => n,
        _ => 1,
    }
}

/// Equality on every partition key of the base table or a view
pub(crate) fn gen_single_partition_query<G, R>(
    t: &Target<'_>,
    g: &G,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Option<Stmt>
where
    G: ValueSource + ?Sized,
    R: Rng + ?Sized,
{
    let old = g.get_old();
    let leased = old.leased_token();
    let vs = old.into_value()?;
    let target = ReadTarget::pick(t, rng);

    let mut read = ReadBuilder::new(t.keyspace, target.name);
    for pk in target.partition_keys {
        read.relation(Relation::eq(&pk.name));
        read.types.push(pk.column_type.clone());
    }
    if let Some(col) = target.extra_key {
        read.values.extend(col.column_type.gen_value(rng, p));
    }
    read.values.extend(vs.value.iter().cloned());
    read.leased_tokens.extend(leased);

    let mut stmt = read.build(target.query_type(StatementType::Select));
    stmt.value_with_token = Some(vs);
    Some(stmt)
}

/// IN lists over the partition keys of the base table or a view
pub(crate) fn gen_multiple_partition_query<G, R>(
    t: &Target<'_>,
    g: &G,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Option<Stmt>
where
    G: ValueSource + ?Sized,
    R: Rng + ?Sized,
{
    let target = ReadTarget::pick(t, rng);
    let mut read = ReadBuilder::new(t.keyspace, target.name);
    if !read.partition_in_lists(target.partition_keys, g, rng, p) {
        read.abandon(g);
        return None;
    }
    Some(read.build(target.query_type(StatementType::Select)))
}

/// One partition, restricted to a clustering range
pub(crate) fn gen_clustering_range_query<G, R>(
    t: &Target<'_>,
    g: &G,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Option<Stmt>
where
    G: ValueSource + ?Sized,
    R: Rng + ?Sized,
{
    let old = g.get_old();
    let leased = old.leased_token();
    let vs = old.into_value()?;
    let target = ReadTarget::pick(t, rng);

    let mut read = ReadBuilder::new(t.keyspace, target.name);
    for pk in target.partition_keys {
        read.relation(Relation::eq(&pk.name));
        read.types.push(pk.column_type.clone());
    }
    if let Some(col) = target.extra_key {
        read.values.extend(col.column_type.gen_value(rng, p));
    }
    read.values.extend(vs.value.iter().cloned());
    read.leased_tokens.extend(leased);
    read.clustering_range(target.clustering_keys, rng, p);

    let mut stmt = read.build(target.query_type(StatementType::SelectRange));
    stmt.value_with_token = Some(vs);
    Some(stmt)
}

/// IN lists over the partition keys plus a clustering range
pub(crate) fn gen_multiple_partition_clustering_range_query<G, R>(
    t: &Target<'_>,
    g: &G,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Option<Stmt>
where
    G: ValueSource + ?Sized,
    R: Rng + ?Sized,
{
    let target = ReadTarget::pick(t, rng);
    let mut read = ReadBuilder::new(t.keyspace, target.name);
    if !read.partition_in_lists(target.partition_keys, g, rng, p) {
        read.abandon(g);
        return None;
    }
    read.clustering_range(target.clustering_keys, rng, p);
    Some(read.build(target.query_type(StatementType::SelectRange)))
}

/// Equality over a random non-empty subset of the secondary indexes
pub(crate) fn gen_single_index_query<R: Rng + ?Sized>(
    t: &Target<'_>,
    rng: &mut R,
    p: &PartitionRangeConfig,
) -> Option<Stmt> {
    let indexes = &t.schema.indexes;
    if indexes.is_empty() {
        return None;
    }
    let count = rng.gen_range(1..=indexes.len());
    let chosen: Vec<_> = indexes.choose_multiple(rng, count).collect();

    let mut read = ReadBuilder::new(t.keyspace, t.name);
    read.allow_filtering = true;
    for idx in chosen {
        let Some(column) = t.schema.columns.iter().find(|c| c.name == idx.column) else {
            continue;
        };
        read.relation(Relation::eq(&column.name));
        read.generated(column, rng, p);
    }
    if read.types.is_empty() {
        return None;
    }
    Some(read.build(StatementType::SelectByIndex))
}
