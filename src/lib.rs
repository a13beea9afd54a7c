//! # cql-twin
//!
//! Schema-aware CQL workload core for differential testing: synthesizes a
//! random schema, hands out partition keys to concurrent workers without
//! ever letting two of them touch the same partition at once, and turns the
//! schema plus a partition key into mutation, validation and schema-change
//! statements to run against a system under test and an oracle.

pub mod config;
pub mod error;
pub mod generators;
pub mod inflight;
pub mod metrics;
pub mod query;
pub mod schema;
pub mod statements;
pub mod typedef;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{DdlError, GeneratorError, SchemaConfigError};
pub use generators::{Generator, GeneratorConfig, Partition, ValueSource};
pub use schema::{Schema, SchemaConfig, Table};
pub use typedef::{StatementType, Stmt};
