//! Statement generation engine
//!
//! Each generator holds the table's shared lock while it builds one
//! statement, so the schema cannot change underneath it. Generators that
//! need a partition value return `None` when the value source shuts down;
//! callers skip the iteration.
//!
//! ```
//! use cql_twin::generators::{Generator, GeneratorConfig};
//! use cql_twin::schema::{Schema, SchemaConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let sc = SchemaConfig::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let schema = Schema::generate(&sc, &mut rng).unwrap();
//! let table = &schema.tables[0];
//!
//! let mut g = Generator::new(
//!     &table.name,
//!     &table.read().partition_keys,
//!     sc.partition_range_config(),
//!     &GeneratorConfig::default(),
//! );
//! g.start().unwrap();
//!
//! let p = sc.partition_range_config();
//! let stmt = schema.gen_mutate_stmt(table, &g, &mut rng, &p, false).unwrap();
//! assert!(stmt.to_cql().0.starts_with("INSERT INTO ks1.table1"));
//! g.complete(&stmt, true);
//! g.stop();
//! ```

pub(crate) mod cache;
mod check;
mod ddl;
mod mutation;

pub use check::num_query_pks;

use crate::error::DdlError;
use crate::generators::ValueSource;
use crate::metrics;
use crate::schema::{DdlProposal, PartitionRangeConfig, Schema, SchemaConfig, Table};
use crate::typedef::Stmt;
use mutation::Target;
use rand::Rng;

impl Schema {
    /// Insert, JSON insert or, rarely and only with `deletes`, a row delete
    ///
    /// Counter tables always get an update. The statement owns the token of
    /// its partition value.
    pub fn gen_mutate_stmt<G, R>(
        &self,
        table: &Table,
        g: &G,
        rng: &mut R,
        p: &PartitionRangeConfig,
        deletes: bool,
    ) -> Option<Stmt>
    where
        G: ValueSource + ?Sized,
        R: Rng + ?Sized,
    {
        let schema = table.read();
        #[cfg(feature = "tracing")]
        let _span = metrics::tracing_helpers::generation_span("mutate", &table.name).entered();

        let vs = g.get()?;
        let t = Target {
            keyspace: &self.keyspace.name,
            name: &table.name,
            schema: &schema,
        };

        let stmt = if !deletes {
            mutation::gen_insert_stmt(&t, vs, rng, p)
        } else {
            match rng.gen_range(0..1000) {
                10 | 100 => mutation::gen_delete_rows(&t, vs, rng, p),
                _ => {
                    if rng.gen_bool(0.5) {
                        mutation::gen_insert_json_stmt(&t, vs, rng, p)
                    } else {
                        mutation::gen_insert_stmt(&t, vs, rng, p)
                    }
                }
            }
        };
        metrics::record_statement(stmt.query_type);
        Some(stmt)
    }

    /// Update of every regular column of one partition
    pub fn gen_update_stmt<G, R>(
        &self,
        table: &Table,
        g: &G,
        rng: &mut R,
        p: &PartitionRangeConfig,
    ) -> Option<Stmt>
    where
        G: ValueSource + ?Sized,
        R: Rng + ?Sized,
    {
        let schema = table.read();
        #[cfg(feature = "tracing")]
        let _span = metrics::tracing_helpers::generation_span("update", &table.name).entered();

        let vs = g.get()?;
        let t = Target {
            keyspace: &self.keyspace.name,
            name: &table.name,
            schema: &schema,
        };
        let stmt = mutation::gen_update_stmt(&t, vs, rng, p);
        metrics::record_statement(stmt.query_type);
        Some(stmt)
    }

    /// One of the read shapes, chosen uniformly
    ///
    /// Tables with secondary indexes add an index-query branch, which itself
    /// only issues an index query one time in five.
    pub fn gen_check_stmt<G, R>(
        &self,
        table: &Table,
        g: &G,
        rng: &mut R,
        p: &PartitionRangeConfig,
    ) -> Option<Stmt>
    where
        G: ValueSource + ?Sized,
        R: Rng + ?Sized,
    {
        let schema = table.read();
        #[cfg(feature = "tracing")]
        let _span = metrics::tracing_helpers::generation_span("check", &table.name).entered();

        let t = Target {
            keyspace: &self.keyspace.name,
            name: &table.name,
            schema: &schema,
        };
        let shapes = if schema.indexes.is_empty() { 4 } else { 5 };
        let stmt = match rng.gen_range(0..shapes) {
            0 => check::gen_single_partition_query(&t, g, rng, p),
            1 => check::gen_multiple_partition_query(&t, g, rng, p),
            2 => check::gen_clustering_range_query(&t, g, rng, p),
            3 => check::gen_multiple_partition_clustering_range_query(&t, g, rng, p),
            _ => {
                if rng.gen_range(0..5) == 0 {
                    check::gen_single_index_query(&t, rng, p)
                } else {
                    check::gen_single_partition_query(&t, g, rng, p)
                }
            }
        }?;
        metrics::record_statement(stmt.query_type);
        Some(stmt)
    }

    /// Propose adding or dropping a column
    ///
    /// Drops are chosen one time in three. Nothing changes until the
    /// proposal is confirmed and applied; see [`crate::schema::SchemaChange`].
    pub fn gen_ddl_stmt<R: Rng + ?Sized>(
        &self,
        table: &Table,
        rng: &mut R,
        sc: &SchemaConfig,
    ) -> Result<DdlProposal, DdlError> {
        let schema = table.read();
        #[cfg(feature = "tracing")]
        let _span = metrics::tracing_helpers::generation_span("ddl", &table.name).entered();

        let proposal = match rng.gen_range(0..3) {
            1 => ddl::drop_column(&self.keyspace.name, &table.name, &schema, rng),
            _ => ddl::add_column(&self.keyspace.name, &table.name, &schema, rng, sc),
        }?;
        for stmt in &proposal.statements {
            metrics::record_statement(stmt.query_type);
        }
        Ok(proposal)
    }

    pub fn gen_add_column<R: Rng + ?Sized>(
        &self,
        table: &Table,
        rng: &mut R,
        sc: &SchemaConfig,
    ) -> Result<DdlProposal, DdlError> {
        ddl::add_column(&self.keyspace.name, &table.name, &table.read(), rng, sc)
    }

    pub fn gen_drop_column<R: Rng + ?Sized>(
        &self,
        table: &Table,
        rng: &mut R,
    ) -> Result<DdlProposal, DdlError> {
        ddl::drop_column(&self.keyspace.name, &table.name, &table.read(), rng)
    }

    /// Propose a type change to a compatible type
    ///
    /// Not part of [`gen_ddl_stmt`](Self::gen_ddl_stmt); some server versions
    /// reject type alteration.
    pub fn gen_alter_column<R: Rng + ?Sized>(
        &self,
        table: &Table,
        rng: &mut R,
    ) -> Result<DdlProposal, DdlError> {
        ddl::alter_column(&self.keyspace.name, &table.name, &table.read(), rng)
    }
}
