//! Subscriber construction.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{Config, Format};
use crate::error::LogError;

/// Builds and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Keeps the root span entered for the lifetime of the process.
///
/// Hold it in `main` until shutdown.
#[derive(Debug)]
#[must_use = "dropping the guard exits the root span"]
pub struct LoggerGuard {
    _root: Option<tracing::span::EnteredSpan>,
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { _root: None }
    }
}

/// Single-line or pretty fmt layer writing to stderr.
macro_rules! fmt_layer {
    ($style:ident, $display:expr) => {
        tracing_subscriber::fmt::layer()
            .$style()
            .with_writer(std::io::stderr)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

/// JSON fmt layer writing to stderr.
macro_rules! json_layer {
    ($display:expr) => {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list($display.span_list)
            .flatten_event($display.flatten)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

impl LoggerBuilder {
    /// Builder for `config`.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Install the subscriber globally.
    ///
    /// Fails when the filter does not parse or a subscriber is already set.
    pub fn build(self) -> Result<LoggerGuard, LogError> {
        let filter = EnvFilter::try_new(&self.config.level).map_err(|source| LogError::Filter {
            filter: self.config.level.clone(),
            source,
        })?;

        let display = &self.config.display;
        let registry = Registry::default().with(filter);
        match self.config.format {
            Format::Pretty => registry.with(fmt_layer!(pretty, display)).try_init()?,
            Format::Compact => registry.with(fmt_layer!(compact, display)).try_init()?,
            Format::Json => registry.with(json_layer!(display)).try_init()?,
        }

        let fields = &self.config.fields;
        let root = (!fields.is_empty()).then(|| {
            tracing::info_span!(
                "app",
                service = fields.service.as_deref().unwrap_or(""),
                instance = fields.instance.as_deref().unwrap_or("")
            )
            .entered()
        });

        Ok(LoggerGuard { _root: root })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_filter() {
        let config = Config {
            level: "beacon=loud".to_string(),
            ..Config::test()
        };
        let err = LoggerBuilder::from_config(config).build().unwrap_err();
        assert!(matches!(err, LogError::Filter { .. }));
        assert!(err.to_string().contains("beacon=loud"));
    }
}
