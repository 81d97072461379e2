// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use topology_metrics::{
    aggregator::{ReferenceMetricAggregator, CONTEXTS},
    aggregator_service::{AggregatorHandle, AggregatorService},
    config::Config,
    listener::ListenerServices,
    parser::SegmentParser,
    segment::Segment,
    services::InstanceCache,
};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Unable to load collector configuration")?;

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).context("could not parse log level in configuration")?,
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    debug!("Starting topology collector");

    let (service, handle) =
        AggregatorService::new(ReferenceMetricAggregator::new(CONTEXTS), config.sink_buffer_size);
    let service_task = tokio::spawn(service.run());

    let instances = Arc::new(InstanceCache::new());
    let parser = SegmentParser::new(ListenerServices {
        instance_resolver: instances.clone(),
        threshold_provider: Arc::new(config.apdex_thresholds()),
        sink: Arc::new(handle.clone()),
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut flush_interval = interval(Duration::from_secs(config.flush_interval_secs));
    flush_interval.tick().await; // discard first tick, which is instantaneous

    info!("Topology collector reading segments from stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&line, &instances, &parser),
                    Ok(None) => {
                        debug!("Reached end of input");
                        break;
                    }
                    Err(e) => {
                        error!("Error reading segments: {e}");
                        break;
                    }
                }
            }
            _ = flush_interval.tick() => {
                flush(&handle).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, shutting down");
                break;
            }
        }
    }

    flush(&handle).await;
    if let Err(e) = handle.shutdown().await {
        error!("Failed to stop aggregator service: {e}");
    }
    service_task
        .await
        .context("aggregator service task failed")?;
    Ok(())
}

fn handle_line(line: &str, instances: &InstanceCache, parser: &SegmentParser) {
    if line.trim().is_empty() {
        return;
    }

    let segment: Segment = match serde_json::from_str(line) {
        Ok(segment) => segment,
        Err(e) => {
            warn!("Skipping undecodable segment: {e}");
            return;
        }
    };

    // A reporting instance always belongs to the application of its own segments.
    instances.register(segment.info.instance_id, segment.info.application_id);

    if let Err(e) = parser.parse(&segment) {
        error!(
            segment_id = segment.info.segment_id.as_str(),
            "Error building application reference metrics: {e}"
        );
    }
}

async fn flush(handle: &AggregatorHandle) {
    let metrics = match handle.flush().await {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Failed to flush application reference metrics: {e}");
            return;
        }
    };

    debug!("Flushing {} application reference metrics", metrics.len());
    for metric in metrics {
        match serde_json::to_string(&metric) {
            Ok(json) => info!(metric_id = metric.id(), "{json}"),
            Err(e) => error!(metric_id = metric.id(), "Failed to serialize metric: {e}"),
        }
    }
}
