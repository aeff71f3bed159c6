//! Counter names recorded by the consumer.

/// Messages fetched from the broker.
pub const RECEIVED: &str = "consumer.received";
/// Messages that failed to decode and were skipped.
pub const MALFORMED: &str = "consumer.malformed";
/// Decoded events handed to the dispatcher.
pub const DISPATCHED: &str = "consumer.dispatched";
/// Handler invocations that failed or panicked.
pub const HANDLER_FAILURES: &str = "consumer.handler_failures";
/// Alerts raised for WARN and ERROR logs.
pub const ALERTS: &str = "consumer.alerts";
/// Log documents written to the index.
pub const PERSISTED: &str = "consumer.persisted";
/// Log events dropped because the index write failed.
pub const PERSIST_FAILURES: &str = "consumer.persist_failures";
/// Fetch errors reported by the broker.
pub const BROKER_ERRORS: &str = "consumer.broker_errors";
/// Time spent dispatching one event, in microseconds.
pub const DISPATCH_MICROS: &str = "consumer.dispatch_micros";
