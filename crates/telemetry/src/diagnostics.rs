//! Per-component observability context.
//!
//! A [`Diagnostics`] value is handed to each component when it is built.
//! Components log inside its span and count into its registry; they never
//! reach for a global logger or a global registry.

use std::future::Future;

use tracing::instrument::Instrumented;
use tracing::{Instrument, Span};

use crate::metrics::{Counter, Gauge, Histogram, MetricsRegistry};

/// Span plus metrics registry for one component.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    component: String,
    span: Span,
    metrics: MetricsRegistry,
}

impl Diagnostics {
    /// Root context for `component`, reporting into `metrics`.
    pub fn new(component: impl Into<String>, metrics: MetricsRegistry) -> Self {
        let component = component.into();
        let span = tracing::info_span!("component", name = %component);
        Self {
            component,
            span,
            metrics,
        }
    }

    /// Root context with a private registry. Mostly useful in tests.
    pub fn detached(component: impl Into<String>) -> Self {
        Self::new(component, MetricsRegistry::new())
    }

    /// Context for a sub-component: nested span, same registry.
    pub fn child(&self, component: impl Into<String>) -> Self {
        let component = format!("{}.{}", self.component, component.into());
        let span = tracing::info_span!(parent: &self.span, "component", name = %component);
        Self {
            component,
            span,
            metrics: self.metrics.clone(),
        }
    }

    /// Dotted component path, e.g. `consumer.router.microservice_logs`.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Span to log under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Registry this component reports to.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Shorthand for `self.metrics().counter(name)`.
    pub fn counter(&self, name: &str) -> Counter {
        self.metrics.counter(name)
    }

    /// Shorthand for `self.metrics().gauge(name)`.
    pub fn gauge(&self, name: &str) -> Gauge {
        self.metrics.gauge(name)
    }

    /// Shorthand for `self.metrics().histogram(name)`.
    pub fn histogram(&self, name: &str) -> Histogram {
        self.metrics.histogram(name)
    }

    /// Run `future` inside this component's span.
    pub fn instrument<F: Future>(&self, future: F) -> Instrumented<F> {
        future.instrument(self.span.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::Diagnostics;

    #[test]
    fn child_extends_path_and_shares_registry() {
        let root = Diagnostics::detached("consumer");
        let child = root.child("router").child("microservice_logs");
        assert_eq!(child.component(), "consumer.router.microservice_logs");

        child.counter("received").inc();
        assert_eq!(root.metrics().snapshot().counter("received"), 1);
    }

    #[test]
    fn detached_contexts_do_not_share() {
        let a = Diagnostics::detached("a");
        let b = Diagnostics::detached("b");
        a.counter("n").inc();
        assert_eq!(b.metrics().snapshot().counter("n"), 0);
    }

    #[tokio::test]
    async fn instrument_runs_future() {
        let diag = Diagnostics::detached("node");
        let out = diag.instrument(async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }
}
