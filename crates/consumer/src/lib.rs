#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Consumer
//!
//! Reads the telemetry topics and acts on every event.
//!
//! - [`Router`] runs one loop per topic under that topic's consumer group.
//!   Malformed payloads are counted and skipped.
//! - [`Dispatcher`] hands each event to a fixed handler set chosen by kind
//!   and severity, isolating handler failures from each other.
//! - [`Renderer`] and [`Alerter`] produce [`RenderedLine`]s for a
//!   [`LineSink`]; styling is the sink's business.
//! - [`Persister`] writes log events into an [`IndexStore`], at most once.
//!
//! [`Consumer`] assembles all of the above from a [`ConsumerConfig`].

pub mod metrics;
pub mod render;

mod alert;
mod config;
mod consumer;
mod dispatch;
mod error;
mod persist;
mod router;
mod sink;
mod store;

pub use alert::{Alerter, alert_line};
pub use config::{ConsumerConfig, DEFAULT_INDEX, GroupConfig, IndexConfig};
pub use consumer::Consumer;
pub use dispatch::{AlertHandler, DispatchReport, Dispatcher, PersistHandler, RenderHandler};
pub use error::{ConfigError, HandlerError, HandlerKind, PersistError, RouterError, StoreError};
pub use persist::{IndexStatus, Persister};
pub use render::{Presentation, RenderedLine, Renderer};
pub use router::{Router, RouterHandle};
pub use sink::{LineSink, MemorySink, WriterSink};
pub use store::{HttpIndexStore, IndexStore, MemoryIndexStore};
