//! Tables and their lock-guarded schema state

use super::column::{names, udt_types, ColumnDef, IndexDef, MaterializedView};
use crate::statements::cache::build_stmt_cache;
use crate::typedef::{StatementCacheType, StmtCache};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Statement shapes a table must avoid because of server-side encoding bugs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnownIssue {
    /// JSON inserts mis-encode tuples (scylladb/scylla#3708)
    JsonWithTuples,
}

/// Everything about a table that DDL may change
///
/// Only reachable through [`Table::read`] and [`Table::write`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub partition_keys: Vec<ColumnDef>,
    pub clustering_keys: Vec<ColumnDef>,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materialized_views: Vec<MaterializedView>,
    #[serde(default)]
    pub known_issues: BTreeSet<KnownIssue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_options: Vec<String>,
    /// Next suffix handed to an added column; names are never reused
    #[serde(default)]
    pub(crate) next_column: usize,
    #[serde(skip)]
    pub(crate) version: u64,
    #[serde(skip)]
    pub(crate) caches: Vec<StmtCache>,
}

impl TableSchema {
    pub fn new(
        partition_keys: Vec<ColumnDef>,
        clustering_keys: Vec<ColumnDef>,
        columns: Vec<ColumnDef>,
    ) -> Self {
        Self {
            partition_keys,
            clustering_keys,
            columns,
            ..Self::default()
        }
    }

    /// Bumped by every applied schema change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Suffix the next added column will get
    pub fn next_column(&self) -> usize {
        self.next_column
    }

    pub fn is_counter_table(&self) -> bool {
        self.columns.len() == 1 && self.columns[0].column_type.is_counter()
    }

    pub fn has_known_issue(&self, issue: KnownIssue) -> bool {
        self.known_issues.contains(&issue)
    }

    /// Cached template for `kind`, if caches were built for the current version
    pub fn stmt_cache(&self, kind: StatementCacheType) -> Option<&StmtCache> {
        self.caches.get(kind.index())
    }

    /// Column referenced by an index or used as a view's extra key
    pub fn is_referenced(&self, column: &str) -> bool {
        self.indexes.iter().any(|i| i.column == column)
            || self.materialized_views.iter().any(|mv| {
                mv.non_primary_key
                    .as_ref()
                    .is_some_and(|c| c.name == column)
            })
    }

    pub(crate) fn refresh_known_issues(&mut self) {
        let has_tuple = self
            .partition_keys
            .iter()
            .chain(&self.clustering_keys)
            .chain(&self.columns)
            .any(|c| c.column_type.is_tuple());
        if has_tuple {
            self.known_issues.insert(KnownIssue::JsonWithTuples);
        } else {
            self.known_issues.remove(&KnownIssue::JsonWithTuples);
        }
    }

    /// Recompute index positions after the column list changed
    pub(crate) fn reindex(&mut self) {
        let columns = &self.columns;
        self.indexes.retain_mut(|idx| {
            match columns.iter().position(|c| c.name == idx.column) {
                Some(pos) => {
                    idx.column_idx = pos;
                    true
                }
                None => false,
            }
        });
    }

    pub(crate) fn rebuild_caches(&mut self, keyspace: &str, table: &str) {
        let caches = StatementCacheType::ALL
            .into_iter()
            .map(|kind| build_stmt_cache(keyspace, table, self, kind))
            .collect();
        self.caches = caches;
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// A table with an exclusive/shared lock guarding its schema
///
/// Statement generation holds the shared lock for the duration of one
/// statement; applying a schema change needs the exclusive lock.
#[derive(Debug)]
pub struct Table {
    pub name: String,
    schema: RwLock<TableSchema>,
}

impl Table {
    pub fn new(name: impl Into<String>, mut schema: TableSchema) -> Self {
        let used = schema
            .columns
            .iter()
            .filter_map(|c| c.name.strip_prefix("col")?.parse::<usize>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        schema.next_column = schema.next_column.max(used).max(schema.columns.len());
        schema.refresh_known_issues();
        schema.reindex();
        Self {
            name: name.into(),
            schema: RwLock::new(schema),
        }
    }

    /// Shared lock for statement generation
    pub fn read(&self) -> RwLockReadGuard<'_, TableSchema> {
        self.schema.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive lock for applying schema changes
    pub fn write(&self) -> RwLockWriteGuard<'_, TableSchema> {
        self.schema.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point-in-time copy of the schema
    pub fn snapshot(&self) -> TableSchema {
        self.read().clone()
    }

    /// `CREATE TABLE` statement, with `WITH` options when configured
    pub fn create_table_statement(&self, keyspace: &str) -> String {
        let t = self.read();
        let columns: Vec<String> = t
            .partition_keys
            .iter()
            .chain(&t.clustering_keys)
            .chain(&t.columns)
            .map(|c| format!("{} {}", c.name, c.column_type.cql_def()))
            .collect();
        let partition_keys = names(&t.partition_keys).join(",");
        let mut stmt = if t.clustering_keys.is_empty() {
            format!(
                "CREATE TABLE IF NOT EXISTS {keyspace}.{} ({}, PRIMARY KEY (({partition_keys})))",
                self.name,
                columns.join(",")
            )
        } else {
            format!(
                "CREATE TABLE IF NOT EXISTS {keyspace}.{} ({}, PRIMARY KEY (({partition_keys}), {}))",
                self.name,
                columns.join(","),
                names(&t.clustering_keys).join(",")
            )
        };
        if !t.table_options.is_empty() {
            stmt.push_str(" WITH ");
            stmt.push_str(&t.table_options.join(" AND "));
        }
        stmt
    }

    /// `CREATE TYPE` statements for every UDT the table uses
    pub fn create_types_statements(&self, keyspace: &str) -> Vec<String> {
        let t = self.read();
        udt_types(&t.columns)
            .values()
            .map(|u| u.create_statement(keyspace))
            .collect()
    }

    pub fn create_index_statements(&self, keyspace: &str) -> Vec<String> {
        self.read()
            .indexes
            .iter()
            .map(|idx| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {keyspace}.{} ({})",
                    idx.name, self.name, idx.column
                )
            })
            .collect()
    }

    pub fn create_materialized_view_statements(&self, keyspace: &str) -> Vec<String> {
        let t = self.read();
        t.materialized_views
            .iter()
            .map(|mv| {
                let not_null: Vec<String> = mv
                    .partition_keys
                    .iter()
                    .chain(&mv.clustering_keys)
                    .map(|c| format!("{} IS NOT NULL", c.name))
                    .collect();
                let partition_keys = names(&mv.partition_keys).join(",");
                let partition_keys = if mv.partition_keys.len() == 1 {
                    partition_keys
                } else {
                    format!("({partition_keys})")
                };
                let mut primary_key = vec![partition_keys];
                primary_key.extend(names(&mv.clustering_keys));
                format!(
                    "CREATE MATERIALIZED VIEW IF NOT EXISTS {keyspace}.{} AS SELECT * FROM {keyspace}.{} WHERE {} PRIMARY KEY ({})",
                    mv.name,
                    self.name,
                    not_null.join(" AND "),
                    primary_key.join(",")
                )
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct TableRepr {
    name: String,
    #[serde(flatten)]
    schema: TableSchema,
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableRepr {
            name: self.name.clone(),
            schema: self.snapshot(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TableRepr::deserialize(deserializer)?;
        Ok(Table::new(repr.name, repr.schema))
    }
}
