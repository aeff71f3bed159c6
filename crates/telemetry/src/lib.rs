#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Telemetry
//!
//! Local observability for beacon components.
//!
//! This crate provides:
//! - [`MetricsRegistry`] -- named counters, gauges and histograms kept in memory
//! - [`Diagnostics`] -- the context every component receives at construction:
//!   a tracing span to log under and the registry to count into
//!
//! Nothing here reads process-wide state. Whoever builds a component decides
//! which span it logs under and which registry it reports to.

pub mod diagnostics;
pub mod metrics;

pub use diagnostics::Diagnostics;
pub use metrics::{Counter, Gauge, Histogram, HistogramSummary, MetricsRegistry, MetricsSnapshot};
