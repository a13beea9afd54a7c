//! Two-phase schema changes
//!
//! A DDL generator only proposes a change. The proposal carries the
//! statements to execute and a [`SchemaChange<Proposed>`]; once both
//! clusters executed the statements the caller turns it into a
//! [`SchemaChange<Confirmed>`] and applies it under the table's exclusive
//! lock:
//!
//! ```text
//! let proposal = schema.gen_ddl_stmt(&table, &mut rng, &sc)?;   // read lock
//! execute(&proposal.statements)?;
//! table.apply(proposal.change.confirm_executed())?;            // write lock
//! ```
//!
//! Every proposal remembers the schema version it was derived from, so of
//! two concurrent proposals only the first one to be applied wins.

use super::column::ColumnDef;
use super::table::{Table, TableSchema};
use crate::error::DdlError;
use crate::typedef::{ColumnType, Stmt};
use std::marker::PhantomData;

/// Change generated but not yet executed
#[derive(Debug)]
pub struct Proposed;

/// Change whose statements executed successfully
#[derive(Debug)]
pub struct Confirmed;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    Add(ColumnDef),
    Drop(String),
    AlterType { column: String, new_type: ColumnType },
}

#[derive(Debug)]
pub struct SchemaChange<State> {
    keyspace: String,
    table: String,
    base_version: u64,
    change: ColumnChange,
    _state: PhantomData<State>,
}

impl<State> SchemaChange<State> {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn change(&self) -> &ColumnChange {
        &self.change
    }

    /// Schema version the change was derived from
    pub fn base_version(&self) -> u64 {
        self.base_version
    }
}

impl SchemaChange<Proposed> {
    pub(crate) fn new(
        keyspace: &str,
        table: &str,
        base_version: u64,
        change: ColumnChange,
    ) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            base_version,
            change,
            _state: PhantomData,
        }
    }

    /// Mark the proposal's statements as executed on both clusters
    pub fn confirm_executed(self) -> SchemaChange<Confirmed> {
        SchemaChange {
            keyspace: self.keyspace,
            table: self.table,
            base_version: self.base_version,
            change: self.change,
            _state: PhantomData,
        }
    }
}

impl SchemaChange<Confirmed> {
    /// Apply the change to the table schema held under its write lock
    ///
    /// # Errors
    ///
    /// [`DdlError::StaleProposal`] if the schema changed since the proposal
    /// was generated, [`DdlError::UnknownColumn`] if the target column is gone.
    pub fn apply(self, schema: &mut TableSchema) -> Result<(), DdlError> {
        if schema.version() != self.base_version {
            log::warn!(
                "rejecting stale schema change on {}.{}: proposed at version {}, now {}",
                self.keyspace,
                self.table,
                self.base_version,
                schema.version()
            );
            return Err(DdlError::StaleProposal {
                table: self.table,
                proposed: self.base_version,
                current: schema.version(),
            });
        }

        match self.change {
            ColumnChange::Add(column) => {
                if let Some(n) = column
                    .name
                    .strip_prefix("col")
                    .and_then(|s| s.parse::<usize>().ok())
                {
                    schema.next_column = schema.next_column.max(n + 1);
                }
                log::info!("{}.{}: added column {}", self.keyspace, self.table, column.name);
                schema.columns.push(column);
            }
            ColumnChange::Drop(name) => {
                let pos = position(schema, &self.table, &name)?;
                schema.columns.remove(pos);
                schema.reindex();
                log::info!("{}.{}: dropped column {name}", self.keyspace, self.table);
            }
            ColumnChange::AlterType { column, new_type } => {
                let pos = position(schema, &self.table, &column)?;
                log::info!(
                    "{}.{}: altered column {column} to {}",
                    self.keyspace,
                    self.table,
                    new_type.name()
                );
                schema.columns[pos].column_type = new_type;
            }
        }

        schema.refresh_known_issues();
        schema.bump_version();
        schema.rebuild_caches(&self.keyspace, &self.table);
        Ok(())
    }
}

fn position(schema: &TableSchema, table: &str, column: &str) -> Result<usize, DdlError> {
    schema
        .columns
        .iter()
        .position(|c| c.name == column)
        .ok_or_else(|| DdlError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

/// Statements to execute plus the change they bring about
#[derive(Debug)]
pub struct DdlProposal {
    pub statements: Vec<Stmt>,
    pub change: SchemaChange<Proposed>,
}

impl Table {
    /// Apply a confirmed change under this table's exclusive lock
    ///
    /// # Errors
    ///
    /// [`DdlError::WrongTable`] if the change was proposed for another
    /// table, otherwise as [`SchemaChange::apply`].
    pub fn apply(&self, change: SchemaChange<Confirmed>) -> Result<(), DdlError> {
        if change.table != self.name {
            log::warn!(
                "rejecting schema change for {}.{} on table {}",
                change.keyspace,
                change.table,
                self.name
            );
            return Err(DdlError::WrongTable {
                expected: self.name.clone(),
                actual: change.table,
            });
        }
        change.apply(&mut self.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::SimpleType;

    fn table() -> Table {
        Table::new(
            "table1",
            TableSchema {
                partition_keys: vec![ColumnDef::new("pk0", SimpleType::Int)],
                columns: vec![
                    ColumnDef::new("col0", SimpleType::Int),
                    ColumnDef::new("col1", SimpleType::Text),
                ],
                ..TableSchema::default()
            },
        )
    }

    fn propose(table: &Table, change: ColumnChange) -> SchemaChange<Proposed> {
        SchemaChange::new("ks1", &table.name, table.read().version(), change)
    }

    #[test]
    fn test_add_then_drop() {
        let t = table();
        let add = propose(&t, ColumnChange::Add(ColumnDef::new("col2", SimpleType::Blob)));
        t.apply(add.confirm_executed()).unwrap();
        assert_eq!(t.read().columns.len(), 3);
        assert_eq!(t.read().next_column, 3);

        let drop = propose(&t, ColumnChange::Drop("col0".to_string()));
        t.apply(drop.confirm_executed()).unwrap();
        let names: Vec<_> = t.read().columns.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["col1", "col2"]);
        assert_eq!(t.read().version(), 2);
    }

    #[test]
    fn test_stale_proposal_is_rejected() {
        let t = table();
        let first = propose(&t, ColumnChange::Drop("col0".to_string()));
        let second = propose(&t, ColumnChange::Drop("col1".to_string()));
        t.apply(first.confirm_executed()).unwrap();
        let err = t.apply(second.confirm_executed()).unwrap_err();
        assert_eq!(
            err,
            DdlError::StaleProposal {
                table: "table1".to_string(),
                proposed: 0,
                current: 1
            }
        );
        assert_eq!(t.read().columns.len(), 1);
    }

    #[test]
    fn test_alter_swaps_type() {
        let t = table();
        let alter = propose(
            &t,
            ColumnChange::AlterType {
                column: "col0".to_string(),
                new_type: SimpleType::Varint.into(),
            },
        );
        t.apply(alter.confirm_executed()).unwrap();
        assert_eq!(
            t.read().columns[0].column_type,
            ColumnType::Simple(SimpleType::Varint)
        );
    }

    #[test]
    fn test_unknown_column() {
        let t = table();
        let drop = propose(&t, ColumnChange::Drop("col9".to_string()));
        assert!(matches!(
            t.apply(drop.confirm_executed()),
            Err(DdlError::UnknownColumn { .. })
        ));
        assert_eq!(t.read().version(), 0);
    }

    #[test]
    fn test_change_for_other_table_is_rejected() {
        let t = table();
        let other = Table::new("table2", t.snapshot());
        let add = propose(&t, ColumnChange::Add(ColumnDef::new("col2", SimpleType::Blob)));
        assert_eq!(
            other.apply(add.confirm_executed()),
            Err(DdlError::WrongTable {
                expected: "table2".to_string(),
                actual: "table1".to_string(),
            })
        );
        assert_eq!(other.read().columns.len(), 2);
        assert_eq!(other.read().version(), 0);
    }

    #[test]
    fn test_apply_rebuilds_caches() {
        let t = table();
        let add = propose(&t, ColumnChange::Add(ColumnDef::new("col2", SimpleType::Blob)));
        t.apply(add.confirm_executed()).unwrap();
        let schema = t.read();
        let cache = schema
            .stmt_cache(crate::typedef::StatementCacheType::Insert)
            .unwrap();
        assert_eq!(cache.len_value, 4);
    }
}
