use super::partition::{OldValue, Partition};
use super::routing::RoutingKey;
use super::{Shutdown, ValueSource};
use crate::inflight::TokenSet;
use crate::metrics;
use crate::schema::{ColumnDef, PartitionRangeConfig};
use crate::typedef::{StatementType, Stmt, Value, ValueWithToken};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the producer parks before re-checking the shutdown signal
const WAKE_UP_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_partition_count")]
    pub partition_count: usize,
    /// Capacity of each partition's fresh-value channel
    #[serde(default = "default_buffer_size")]
    pub partition_buffer_size: usize,
    /// Capacity of each partition's recycle buffer
    #[serde(default = "default_buffer_size")]
    pub old_buffer_size: usize,
    /// Seed of the producer's value stream
    #[serde(default)]
    pub seed: u64,
}

fn default_partition_count() -> usize {
    10
}

fn default_buffer_size() -> usize {
    100
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            partition_count: default_partition_count(),
            partition_buffer_size: default_buffer_size(),
            old_buffer_size: default_buffer_size(),
            seed: 0,
        }
    }
}

/// A table's key space spread over several partitions
///
/// All partitions share one token set, one wake-up signal and one shutdown
/// signal. Values are routed to partition `token % partition_count`.
pub struct Generator {
    table: String,
    partitions: Vec<Partition>,
    shutdown: Shutdown,
    producer: Option<Producer>,
    handle: Option<JoinHandle<()>>,
}

/// State moved into the producer thread
struct Producer {
    senders: Vec<Sender<ValueWithToken>>,
    wake_up: Receiver<()>,
    partition_keys: Vec<ColumnDef>,
    routing: RoutingKey,
    range: PartitionRangeConfig,
    shutdown: Shutdown,
    rng: StdRng,
}

impl Generator {
    pub fn new(
        table: &str,
        partition_keys: &[ColumnDef],
        range: PartitionRangeConfig,
        config: &GeneratorConfig,
    ) -> Self {
        let count = config.partition_count.max(1);
        let in_flight = Arc::new(TokenSet::new());
        let shutdown = Shutdown::new();
        let (wake_tx, wake_rx) = bounded(1);

        let mut senders = Vec::with_capacity(count);
        let mut partitions = Vec::with_capacity(count);
        for _ in 0..count {
            let (tx, rx) = bounded(config.partition_buffer_size);
            senders.push(tx);
            partitions.push(Partition::new(
                rx,
                config.old_buffer_size,
                Arc::clone(&in_flight),
                wake_tx.clone(),
                shutdown.clone(),
            ));
        }

        Self {
            table: table.to_string(),
            partitions,
            shutdown: shutdown.clone(),
            producer: Some(Producer {
                senders,
                wake_up: wake_rx,
                partition_keys: partition_keys.to_vec(),
                routing: RoutingKey::for_partition_keys(partition_keys),
                range,
                shutdown,
                rng: StdRng::seed_from_u64(config.seed),
            }),
            handle: None,
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, idx: usize) -> Option<&Partition> {
        self.partitions.get(idx)
    }

    pub fn shutdown_signal(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Spawn the producer thread; a no-op if it already ran
    pub fn start(&mut self) -> std::io::Result<()> {
        let Some(producer) = self.producer.take() else {
            log::warn!("value producer for {} already started", self.table);
            return Ok(());
        };
        let name = format!("cql-twin-producer-{}", self.table);
        log::debug!("starting value producer for {}", self.table);
        self.handle = Some(std::thread::Builder::new().name(name).spawn(move || producer.run())?);
        Ok(())
    }

    /// Trigger shutdown and wait for the producer thread to exit
    ///
    /// Values already buffered stay available; once drained, `get` returns
    /// `None`.
    pub fn stop(&mut self) {
        self.shutdown.trigger();
        // Never started: drop the senders so consumers see the supply closed.
        self.producer = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("value producer for {} panicked", self.table);
            }
        }
        log::debug!("value producer for {} stopped", self.table);
    }

    /// Settle the tokens and values of an executed statement
    ///
    /// Releases every token the statement leased. After a successful insert
    /// or update the target partition is offered for later reads.
    pub fn complete(&self, stmt: &Stmt, executed_ok: bool) {
        for token in &stmt.leased_tokens {
            self.release_token(*token);
        }
        let recyclable = matches!(
            stmt.query_type,
            StatementType::Insert | StatementType::InsertJson | StatementType::Update
        );
        if executed_ok && recyclable {
            if let Some(v) = &stmt.value_with_token {
                self.give_old(v.clone());
            }
        }
    }

    fn route(&self, token: u64) -> &Partition {
        &self.partitions[(token % self.partitions.len() as u64) as usize]
    }

    fn random_partition(&self) -> &Partition {
        let idx = rand::thread_rng().gen_range(0..self.partitions.len());
        &self.partitions[idx]
    }
}

impl ValueSource for Generator {
    fn get(&self) -> Option<ValueWithToken> {
        self.random_partition().get()
    }

    fn get_old(&self) -> OldValue {
        self.random_partition().get_old()
    }

    fn give_old(&self, value: ValueWithToken) {
        self.route(value.token).give_old(value);
    }

    fn release_token(&self, token: u64) {
        self.route(token).release_token(token);
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("table", &self.table)
            .field("partitions", &self.partitions.len())
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl Producer {
    /// Keep every partition topped up until shutdown
    ///
    /// Once every partition rejected a value the producer parks on the
    /// wake-up signal, polling so shutdown is still observed.
    fn run(mut self) {
        let count = self.senders.len();
        let mut filled = vec![false; count];
        let mut num_filled = 0;

        while !self.shutdown.is_triggered() {
            let values: Vec<Value> = self
                .partition_keys
                .iter()
                .flat_map(|c| c.column_type.gen_value(&mut self.rng, &self.range))
                .collect();
            let token = self.routing.token(&values);
            let idx = (token % count as u64) as usize;

            match self.senders[idx].try_send(ValueWithToken::new(values, token)) {
                Ok(()) => metrics::record_value_produced(),
                Err(TrySendError::Full(_)) => {
                    if !filled[idx] {
                        filled[idx] = true;
                        num_filled += 1;
                    }
                    if num_filled < count {
                        continue;
                    }
                    log::debug!("all {count} partitions full, waiting for wake-up");
                    match self.wake_up.recv_timeout(WAKE_UP_POLL) {
                        Ok(()) | Err(RecvTimeoutError::Timeout) => {
                            filled.iter_mut().for_each(|f| *f = false);
                            num_filled = 0;
                        }
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
