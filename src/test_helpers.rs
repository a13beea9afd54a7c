//! Fixtures for unit and integration tests
//!
//! Enabled for this crate's own tests and, through the `test-helpers`
//! feature, for downstream suites.

use crate::generators::{OldValue, Partition, RoutingKey, Shutdown, ValueSource};
use crate::inflight::TokenSet;
use crate::schema::{ColumnDef, Keyspace, Replication, Schema, SchemaBuilder, Table};
use crate::typedef::{ColumnType, SimpleType, Value, ValueWithToken};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;

/// Columns named `{prefix}0..` with the given types
pub fn columns(prefix: &str, types: &[ColumnType]) -> Vec<ColumnDef> {
    types
        .iter()
        .enumerate()
        .map(|(i, t)| ColumnDef::new(format!("{prefix}{i}"), t.clone()))
        .collect()
}

/// `n` columns of a single simple type
pub fn simple_columns(prefix: &str, n: usize, t: SimpleType) -> Vec<ColumnDef> {
    columns(prefix, &vec![ColumnType::Simple(t); n])
}

/// Schema in keyspace `ks1` holding exactly `tables`
pub fn schema_with(tables: Vec<Table>) -> Schema {
    let builder = SchemaBuilder::new().keyspace(Keyspace {
        name: "ks1".to_string(),
        replication: Replication::default(),
        oracle_replication: Replication::default(),
    });
    tables
        .into_iter()
        .fold(builder, SchemaBuilder::table)
        .build()
}

/// Value with its routing token for the given partition keys
pub fn value_with_token(partition_keys: &[ColumnDef], value: Vec<Value>) -> ValueWithToken {
    let token = RoutingKey::for_partition_keys(partition_keys).token(&value);
    ValueWithToken::new(value, token)
}

/// A single partition fed by hand
pub struct ManualSource {
    pub values: Sender<ValueWithToken>,
    pub wake_up: Receiver<()>,
    pub shutdown: Shutdown,
    pub partition: Partition,
}

impl ManualSource {
    pub fn new(capacity: usize) -> Self {
        let (values, rx) = bounded(capacity);
        let (wake_tx, wake_up) = bounded(1);
        let shutdown = Shutdown::new();
        let partition = Partition::new(
            rx,
            capacity,
            Arc::new(TokenSet::new()),
            wake_tx,
            shutdown.clone(),
        );
        Self {
            values,
            wake_up,
            shutdown,
            partition,
        }
    }

    /// Queue a fresh value; panics if the channel is full
    pub fn push(&self, v: ValueWithToken) {
        self.values
            .try_send(v)
            .unwrap_or_else(|e| panic!("manual source is full: {e}"));
    }

    pub fn in_flight(&self) -> &TokenSet {
        self.partition.in_flight()
    }
}

impl ValueSource for ManualSource {
    fn get(&self) -> Option<ValueWithToken> {
        self.partition.get()
    }

    fn get_old(&self) -> OldValue {
        self.partition.get_old()
    }

    fn give_old(&self, value: ValueWithToken) {
        self.partition.give_old(value)
    }

    fn release_token(&self, token: u64) {
        self.partition.release_token(token)
    }
}
