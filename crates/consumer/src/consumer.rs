//! Wires the handler set, the index store and the router together.

use std::fmt;
use std::sync::Arc;

use beacon_broker::Broker;
use beacon_telemetry::Diagnostics;
use tokio_util::sync::CancellationToken;

use crate::alert::Alerter;
use crate::config::{ConsumerConfig, IndexConfig};
use crate::dispatch::Dispatcher;
use crate::error::RouterError;
use crate::persist::Persister;
use crate::render::Renderer;
use crate::router::{Router, RouterHandle};
use crate::sink::LineSink;
use crate::store::{HttpIndexStore, IndexStore};

/// A consumer process: every configured topic rendered to one sink, WARN
/// and ERROR logs alerted, logs optionally persisted.
pub struct Consumer {
    config: ConsumerConfig,
    sink: Arc<dyn LineSink>,
    store: Option<Arc<dyn IndexStore>>,
    diagnostics: Diagnostics,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("config", &self.config)
            .field("custom_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl Consumer {
    /// Consumer writing lines to `sink`.
    pub fn new(config: ConsumerConfig, sink: Arc<dyn LineSink>, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            sink,
            store: None,
            diagnostics,
        }
    }

    /// Persist into `store` instead of the HTTP store at `index.url`.
    ///
    /// Turns persistence on with the default index when none is configured.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn IndexStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Prepare the index, subscribe every topic and start consuming.
    ///
    /// Fails when the configuration is invalid or a subscription cannot be
    /// made. An unreachable index store is logged; persistence stays on and
    /// each failed write is dropped.
    pub async fn start(
        self,
        broker: Arc<dyn Broker>,
        shutdown: CancellationToken,
    ) -> Result<RouterHandle, RouterError> {
        self.config.validate()?;

        let renderer = Arc::new(Renderer::new(Arc::clone(&self.sink)));
        let alerter = Arc::new(Alerter::new(Arc::clone(&self.sink), &self.diagnostics));
        let mut dispatcher =
            Dispatcher::new(renderer, alerter, self.diagnostics.child("dispatcher"));

        if let Some(persister) = self.persister()? {
            match persister.ensure_index().await {
                Ok(status) => {
                    tracing::info!(
                        parent: self.diagnostics.span(),
                        index = persister.index(),
                        ?status,
                        "persistence enabled"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        parent: self.diagnostics.span(),
                        index = persister.index(),
                        %error,
                        "index not ready; writes will be attempted anyway"
                    );
                }
            }
            dispatcher = dispatcher.with_persister(Arc::new(persister));
        }

        let router = Router::new(
            self.config,
            Arc::new(dispatcher),
            self.diagnostics.child("router"),
        )?;
        router.start(broker, shutdown).await
    }

    fn persister(&self) -> Result<Option<Persister>, RouterError> {
        let index = match (&self.config.index, &self.store) {
            (Some(index), _) => index.clone(),
            (None, Some(_)) => IndexConfig::default(),
            (None, None) => return Ok(None),
        };
        let store: Arc<dyn IndexStore> = match &self.store {
            Some(store) => Arc::clone(store),
            None => Arc::new(HttpIndexStore::new(index.url.clone(), index.timeout)?),
        };
        Ok(Some(Persister::new(
            store,
            index.name,
            index.timeout,
            self.diagnostics.child("persister"),
        )))
    }
}
