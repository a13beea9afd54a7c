//! Partition value generation
//!
//! A [`Partition`] hands out partition-key values without ever giving two
//! concurrent consumers the same token. A [`Generator`] fans a table's key
//! space out over several partitions and runs the producer thread that
//! keeps them filled.

mod generator;
mod partition;
pub mod routing;

pub use generator::{Generator, GeneratorConfig};
pub use partition::{OldValue, Partition, Recycle};
pub use routing::RoutingKey;

use crate::typedef::ValueWithToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation signal
///
/// Cloning shares the flag; once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Source of partition values for the statement engine
///
/// Implemented by a single [`Partition`] and by the fan-out [`Generator`].
pub trait ValueSource {
    /// Fresh value whose token is now owned by the caller; `None` once the
    /// value supply is closed
    fn get(&self) -> Option<ValueWithToken>;

    /// Previously used value, or a fresh one when none is buffered
    fn get_old(&self) -> OldValue;

    /// Offer a used value for later reads; dropped if the buffer is full
    fn give_old(&self, value: ValueWithToken);

    /// Give up ownership of `token`
    fn release_token(&self, token: u64);
}
