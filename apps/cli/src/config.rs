//! Layered configuration: defaults, then `beacon.toml`, then `BEACON_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use beacon_broker::{BrokerConfig, BrokerError};
use beacon_consumer::ConsumerConfig;
use beacon_producer::NodeConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::cli::SourceArgs;

/// File read when `--config` is not given.
pub const DEFAULT_FILE: &str = "beacon.toml";

/// Services started when none are configured.
pub const DEFAULT_SERVICES: [&str; 3] = ["PaymentService", "OrderService", "InventoryService"];

/// `BEACON_*` variables that belong to the logger or the flag parser.
const RESERVED_ENV: [&str; 6] = [
    "log",
    "log_format",
    "log_colors",
    "service",
    "instance",
    "config",
];

/// Everything `beacon run` needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the in-process broker is hosted at. Nothing is hosted when
    /// absent, and startup fails unless a bootstrap address resolves.
    pub host: Option<String>,

    /// How nodes and the consumer reach the broker.
    pub broker: BrokerConfig,

    /// The consumer process.
    pub consumer: ConsumerConfig,

    /// One entry per simulated node.
    pub nodes: Vec<NodeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let broker = BrokerConfig::default();
        Self {
            host: broker.bootstrap_servers.first().cloned(),
            broker,
            consumer: ConsumerConfig::default(),
            nodes: DEFAULT_SERVICES
                .into_iter()
                .map(NodeConfig::for_service)
                .collect(),
        }
    }
}

/// Configuration that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly named file does not exist.
    #[error("configuration file {} not found", .0.display())]
    MissingFile(PathBuf),

    /// A source could not be read or does not fit the schema.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Broker settings are invalid.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Consumer settings are invalid.
    #[error("consumer: {0}")]
    Consumer(#[from] beacon_consumer::ConfigError),

    /// A node's settings are invalid.
    #[error("node {index} ({service}): {source}")]
    Node {
        /// Position in the node list.
        index: usize,
        /// Configured service name.
        service: String,
        /// What is wrong.
        #[source]
        source: beacon_producer::ConfigError,
    },
}

impl AppConfig {
    /// Load from every layer described by `source`.
    pub fn load(source: &SourceArgs) -> Result<Self, ConfigError> {
        let mut config: Self = figment(source.config.as_deref())?
            .extract()
            .map_err(Box::new)?;
        apply_flags(&mut config, source);
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.consumer.validate()?;
        for (index, node) in self.nodes.iter().enumerate() {
            node.validate().map_err(|source| ConfigError::Node {
                index,
                service: node.service_name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let file = match path {
        Some(path) if !path.exists() => return Err(ConfigError::MissingFile(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_FILE),
    };
    Ok(Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(file))
        .merge(
            Env::prefixed("BEACON_")
                .ignore(&RESERVED_ENV)
                .split("__"),
        ))
}

fn apply_flags(config: &mut AppConfig, flags: &SourceArgs) {
    if !flags.brokers.is_empty() {
        config.broker.bootstrap_servers.clone_from(&flags.brokers);
        if config.host.is_some() {
            config.host = flags.brokers.first().cloned();
        }
    }
    if flags.no_host {
        config.host = None;
    }
    if !flags.services.is_empty() {
        config.nodes = flags
            .services
            .iter()
            .map(|service| NodeConfig::for_service(service.as_str()))
            .collect();
    }
    if let Some(url) = &flags.index_url {
        let mut index = config.consumer.index.take().unwrap_or_default();
        index.url.clone_from(url);
        config.consumer.index = Some(index);
    }
    if let Some(seed) = flags.seed {
        for (offset, node) in (0u64..).zip(config.nodes.iter_mut()) {
            node.seed = Some(seed.wrapping_add(offset));
        }
    }
}
