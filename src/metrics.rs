//! Generation counters and tracing spans
//!
//! With the `metrics` feature the counters are recorded through the global
//! OpenTelemetry meter; without it every `record_*` call compiles to nothing.

use crate::typedef::StatementType;

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{global, metrics::Counter, KeyValue};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<CqlTwinMetrics> = Lazy::new(CqlTwinMetrics::init);

#[cfg(feature = "metrics")]
pub struct CqlTwinMetrics {
    pub statements_generated: Counter<u64>,
    pub tokens_acquired: Counter<u64>,
    pub token_retries: Counter<u64>,
    pub values_produced: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl CqlTwinMetrics {
    pub fn init() -> Self {
        let meter = global::meter("cql_twin");

        let statements_generated = meter
            .u64_counter("cql_twin_statements_generated_total")
            .with_description("Statements generated, by statement type")
            .build();

        let tokens_acquired = meter
            .u64_counter("cql_twin_tokens_acquired_total")
            .with_description("Partition tokens taken into flight")
            .build();

        let token_retries = meter
            .u64_counter("cql_twin_token_retries_total")
            .with_description("Values skipped because their token was already in flight")
            .build();

        let values_produced = meter
            .u64_counter("cql_twin_values_produced_total")
            .with_description("Partition values pushed by the producer")
            .build();

        Self {
            statements_generated,
            tokens_acquired,
            token_retries,
            values_produced,
        }
    }
}

pub fn record_statement(kind: StatementType) {
    #[cfg(feature = "metrics")]
    METRICS
        .statements_generated
        .add(1, &[KeyValue::new("type", kind.as_str())]);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

pub fn record_token_acquired() {
    #[cfg(feature = "metrics")]
    METRICS.tokens_acquired.add(1, &[]);
}

pub fn record_token_retry() {
    #[cfg(feature = "metrics")]
    METRICS.token_retries.add(1, &[]);
}

pub fn record_value_produced() {
    #[cfg(feature = "metrics")]
    METRICS.values_produced.add(1, &[]);
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span entered around one statement generation call
    pub fn generation_span(kind: &'static str, table: &str) -> Span {
        tracing::debug_span!("generate_statement", kind, table)
    }
}
