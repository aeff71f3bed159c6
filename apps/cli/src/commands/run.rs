//! `beacon run`: the whole fleet in one process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use beacon_broker::{BrokerDirectory, MemoryBroker};
use beacon_consumer::Consumer;
use beacon_producer::{EventGenerator, NodeHandle};
use beacon_telemetry::{Diagnostics, MetricsRegistry, MetricsSnapshot};
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::console::ConsoleSink;

/// Gauge of nodes started by this process.
const NODES: &str = "fleet.nodes";

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = AppConfig::load(&args.source)?;
    config.validate()?;

    let metrics = MetricsRegistry::new();
    let diagnostics = Diagnostics::new("beacon", metrics.clone());
    let directory = BrokerDirectory::new();
    if let Some(address) = &config.host {
        directory.host(address.clone(), MemoryBroker::new(config.broker.partitions));
    }

    let shutdown = CancellationToken::new();
    spawn_interrupt(shutdown.clone(), args.duration);

    let sink = ConsoleSink::stdout(args.color);
    let consumer_broker = directory
        .connect(&config.broker)
        .await
        .context("consumer could not reach the broker")?;
    let router = Consumer::new(
        config.consumer.clone(),
        Arc::new(sink.clone()),
        diagnostics.child("consumer"),
    )
    .start(consumer_broker, shutdown.clone())
    .await
    .context("failed to start the consumer")?;

    let fleet = diagnostics.child("fleet");
    let mut nodes: Vec<NodeHandle> = Vec::with_capacity(config.nodes.len());
    for node in &config.nodes {
        let broker = directory
            .connect(&config.broker)
            .await
            .with_context(|| format!("{} could not reach the broker", node.service_name))?;
        let generator = EventGenerator::new(node, broker, fleet.clone())?;
        tracing::info!(node = %generator.identity(), "starting node");
        nodes.push(generator.start(shutdown.clone()));
    }
    fleet.gauge(NODES).set(i64::try_from(nodes.len()).unwrap_or(i64::MAX));

    shutdown.cancelled().await;
    tracing::info!("shutting down");
    for node in nodes {
        node.join().await;
    }
    router.shutdown().await;

    if !args.no_stats {
        print_stats(&sink, &metrics.snapshot())?;
    }
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C, or once `limit` has elapsed.
fn spawn_interrupt(shutdown: CancellationToken, limit: Option<Duration>) {
    tokio::spawn(async move {
        wait_for_interrupt(tokio::signal::ctrl_c(), limit).await;
        shutdown.cancel();
    });
}

/// Resolve on the first of `signal` or `limit`.
///
/// A signal that cannot be installed leaves only the deadline.
async fn wait_for_interrupt(
    signal: impl Future<Output = std::io::Result<()>>,
    limit: Option<Duration>,
) {
    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::select! {
        result = signal => match result {
            Ok(()) => return,
            Err(error) => tracing::error!(%error, "cannot listen for Ctrl-C"),
        },
        () = &mut deadline => return,
    }
    deadline.await;
}

fn print_stats(sink: &ConsoleSink, snapshot: &MetricsSnapshot) -> std::io::Result<()> {
    sink.plain("")?;
    sink.plain("statistics")?;
    for (name, value) in &snapshot.counters {
        sink.plain(&format!("  {name:<28} {value}"))?;
    }
    for (name, value) in &snapshot.gauges {
        sink.plain(&format!("  {name:<28} {value}"))?;
    }
    for (name, summary) in &snapshot.histograms {
        if let Some(mean) = summary.mean() {
            sink.plain(&format!(
                "  {name:<28} n={} mean={mean:.0} max={}",
                summary.count, summary.max
            ))?;
        }
    }
    Ok(())
}
