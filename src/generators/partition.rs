use super::{Shutdown, ValueSource};
use crate::error::GeneratorError;
use crate::inflight::TokenSet;
use crate::metrics;
use crate::typedef::ValueWithToken;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Outcome of a non-blocking read of the recycle buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Recycle {
    /// The shared shutdown signal was triggered
    Cancelled,
    /// Nothing buffered right now
    Empty,
    Value(ValueWithToken),
}

/// Value handed out for a read
#[derive(Debug, Clone, PartialEq)]
pub enum OldValue {
    /// Stop, the generator is shutting down
    Cancelled,
    /// A value used before; its token is not owned by the caller
    Recycled(ValueWithToken),
    /// A new value; the caller owns its token and must release it
    Fresh(ValueWithToken),
}

impl OldValue {
    pub fn value(&self) -> Option<&ValueWithToken> {
        match self {
            OldValue::Cancelled => None,
            OldValue::Recycled(v) | OldValue::Fresh(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Option<ValueWithToken> {
        match self {
            OldValue::Cancelled => None,
            OldValue::Recycled(v) | OldValue::Fresh(v) => Some(v),
        }
    }

    /// Token the caller must release, if any
    pub fn leased_token(&self) -> Option<u64> {
        match self {
            OldValue::Fresh(v) => Some(v.token),
            OldValue::Cancelled | OldValue::Recycled(_) => None,
        }
    }
}

/// One partition of a key space
///
/// Fresh values arrive on a bounded channel filled by an external producer.
/// Used values can be handed back for later reads through a bounded recycle
/// buffer.
#[derive(Debug)]
pub struct Partition {
    values: Receiver<ValueWithToken>,
    old_values_tx: Sender<ValueWithToken>,
    old_values: Receiver<ValueWithToken>,
    in_flight: Arc<TokenSet>,
    wake_up: Sender<()>,
    shutdown: Shutdown,
}

impl Partition {
    pub fn new(
        values: Receiver<ValueWithToken>,
        old_capacity: usize,
        in_flight: Arc<TokenSet>,
        wake_up: Sender<()>,
        shutdown: Shutdown,
    ) -> Self {
        let (old_values_tx, old_values) = bounded(old_capacity);
        Self {
            values,
            old_values_tx,
            old_values,
            in_flight,
            wake_up,
            shutdown,
        }
    }

    /// Next fresh value, blocking while the channel is empty
    ///
    /// Requests a refill when the channel drops to a quarter of its capacity
    /// or runs dry. Returns `None` once the channel is closed and drained.
    pub fn pick(&self) -> Option<ValueWithToken> {
        match self.values.try_recv() {
            Ok(v) => {
                let low_water = self.values.capacity().unwrap_or(0) / 4;
                if self.values.len() <= low_water {
                    self.wake_up();
                }
                Some(v)
            }
            Err(TryRecvError::Empty) => {
                self.wake_up();
                self.values.recv().ok()
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Bounded form of [`ValueSource::get`]
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Closed`] if the value supply closed,
    /// [`GeneratorError::TokenSpaceExhausted`] if every one of the
    /// `max_attempts` values was already in flight.
    pub fn try_get(&self, max_attempts: usize) -> Result<ValueWithToken, GeneratorError> {
        for _ in 0..max_attempts {
            let v = self.pick().ok_or(GeneratorError::Closed)?;
            if self.in_flight.add_if_not_present(v.token) {
                metrics::record_token_acquired();
                return Ok(v);
            }
            metrics::record_token_retry();
        }
        Err(GeneratorError::TokenSpaceExhausted {
            attempts: max_attempts,
        })
    }

    /// Non-blocking read of the recycle buffer
    pub fn try_old(&self) -> Recycle {
        if self.shutdown.is_triggered() {
            return Recycle::Cancelled;
        }
        match self.old_values.try_recv() {
            Ok(v) => Recycle::Value(v),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Recycle::Empty,
        }
    }

    pub fn in_flight(&self) -> &TokenSet {
        &self.in_flight
    }

    /// Number of fresh values buffered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn wake_up(&self) {
        // A pending signal already covers this request.
        let _ = self.wake_up.try_send(());
    }
}

impl ValueSource for Partition {
    /// Loops until it obtains a value whose token nobody else owns
    ///
    /// There is no backoff; see [`Partition::try_get`] for a bounded variant.
    fn get(&self) -> Option<ValueWithToken> {
        loop {
            let v = self.pick()?;
            if self.in_flight.add_if_not_present(v.token) {
                metrics::record_token_acquired();
                return Some(v);
            }
            metrics::record_token_retry();
        }
    }

    fn get_old(&self) -> OldValue {
        match self.try_old() {
            Recycle::Cancelled => OldValue::Cancelled,
            Recycle::Value(v) => OldValue::Recycled(v),
            Recycle::Empty => match self.get() {
                Some(v) => OldValue::Fresh(v),
                None => OldValue::Cancelled,
            },
        }
    }

    fn give_old(&self, value: ValueWithToken) {
        let _ = self.old_values_tx.try_send(value);
    }

    fn release_token(&self, token: u64) {
        self.in_flight.delete(token);
    }
}
