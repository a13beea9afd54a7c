//! Schema-evolution proposals

use crate::error::DdlError;
use crate::schema::column::{gen_column_name, gen_column_type};
use crate::schema::{ColumnChange, ColumnDef, DdlProposal, SchemaChange, SchemaConfig, TableSchema};
use crate::typedef::{ColumnType, StatementType, Stmt};
use rand::seq::SliceRandom;
use rand::Rng;

/// New column with a never used name, preceded by `CREATE TYPE` for a UDT
pub(crate) fn add_column<R: Rng + ?Sized>(
    keyspace: &str,
    table: &str,
    t: &TableSchema,
    rng: &mut R,
    sc: &SchemaConfig,
) -> Result<DdlProposal, DdlError> {
    if t.is_counter_table() {
        return Err(DdlError::CounterTable {
            table: table.to_string(),
        });
    }
    let name = gen_column_name("col", t.next_column);
    let column_type = gen_column_type(rng, t.columns.len() + 1, sc);

    let mut statements = Vec::with_capacity(2);
    if let ColumnType::Udt(udt) = &column_type {
        statements.push(Stmt::raw(
            udt.create_statement(keyspace),
            StatementType::AddColumn,
        ));
    }
    statements.push(Stmt::raw(
        format!(
            "ALTER TABLE {keyspace}.{table} ADD {name} {}",
            column_type.cql_def()
        ),
        StatementType::AddColumn,
    ));
    log::debug!("proposing {keyspace}.{table} ADD {name} {}", column_type.name());

    Ok(DdlProposal {
        statements,
        change: SchemaChange::new(
            keyspace,
            table,
            t.version(),
            ColumnChange::Add(ColumnDef::new(name, column_type)),
        ),
    })
}

/// Drop a random column that no index depends on
///
/// The last regular column is never dropped. Tables with a materialized
/// view select every base column, so none of their columns is droppable.
pub(crate) fn drop_column<R: Rng + ?Sized>(
    keyspace: &str,
    table: &str,
    t: &TableSchema,
    rng: &mut R,
) -> Result<DdlProposal, DdlError> {
    if t.is_counter_table() {
        return Err(DdlError::CounterTable {
            table: table.to_string(),
        });
    }
    if t.columns.is_empty() {
        return Err(DdlError::NoColumns {
            table: table.to_string(),
        });
    }
    let candidates: Vec<&ColumnDef> = if t.materialized_views.is_empty() {
        t.columns
            .iter()
            .filter(|c| !t.is_referenced(&c.name))
            .collect()
    } else {
        Vec::new()
    };
    let column = match candidates.choose(rng) {
        Some(c) if t.columns.len() > 1 => c,
        _ => {
            return Err(DdlError::NoDroppableColumn {
                table: table.to_string(),
            })
        }
    };

    log::debug!("proposing {keyspace}.{table} DROP {}", column.name);
    Ok(DdlProposal {
        statements: vec![Stmt::raw(
            format!("ALTER TABLE {keyspace}.{table} DROP {}", column.name),
            StatementType::DropColumn,
        )],
        change: SchemaChange::new(
            keyspace,
            table,
            t.version(),
            ColumnChange::Drop(column.name.clone()),
        ),
    })
}

/// Change a random simple column to a compatible type
pub(crate) fn alter_column<R: Rng + ?Sized>(
    keyspace: &str,
    table: &str,
    t: &TableSchema,
    rng: &mut R,
) -> Result<DdlProposal, DdlError> {
    let column = t.columns.choose(rng).ok_or_else(|| DdlError::NoColumns {
        table: table.to_string(),
    })?;
    let ColumnType::Simple(old_type) = &column.column_type else {
        return Err(DdlError::ComplexType {
            column: column.name.clone(),
        });
    };
    let new_type = old_type
        .compatible_types()
        .choose(rng)
        .copied()
        .ok_or_else(|| DdlError::NoCompatibleType {
            column: column.name.clone(),
        })?;

    log::debug!(
        "proposing {keyspace}.{table} ALTER {} TYPE {}",
        column.name,
        new_type.name()
    );
    Ok(DdlProposal {
        statements: vec![Stmt::raw(
            format!(
                "ALTER TABLE {keyspace}.{table} ALTER {} TYPE {}",
                column.name,
                new_type.name()
            ),
            StatementType::AlterColumn,
        )],
        change: SchemaChange::new(
            keyspace,
            table,
            t.version(),
            ColumnChange::AlterType {
                column: column.name.clone(),
                new_type: new_type.into(),
            },
        ),
    })
}
