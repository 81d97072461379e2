// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Actor owning a [`ReferenceMetricAggregator`].
//!
//! Listeners submit through an [`AggregatorHandle`], which is a [`DispatchSink`] backed by a
//! bounded channel. Submission never waits: when the channel is full or the service has stopped
//! the metric is rejected with [`MetricError::SinkUnavailable`].

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::aggregator::ReferenceMetricAggregator;
use crate::error::MetricError;
use crate::metric::RelationshipMetric;
use crate::services::{DispatchSink, GraphKey, APPLICATION_REFERENCE_METRIC_GRAPH};

/// Default capacity of the command channel.
pub const SINK_BUFFER_SIZE: usize = 1000;

#[derive(Debug)]
pub enum AggregatorCommand {
    Insert(RelationshipMetric),
    Flush(oneshot::Sender<Vec<RelationshipMetric>>),
    GetEntryById {
        id: String,
        response_tx: oneshot::Sender<Option<RelationshipMetric>>,
    },
    Shutdown,
}

#[derive(Clone)]
pub struct AggregatorHandle {
    tx: mpsc::Sender<AggregatorCommand>,
}

impl AggregatorHandle {
    pub async fn flush(&self) -> Result<Vec<RelationshipMetric>, MetricError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(AggregatorCommand::Flush(response_tx))
            .await
            .map_err(|e| MetricError::SinkUnavailable(format!("Failed to send flush command: {e}")))?;

        response_rx.await.map_err(|e| {
            MetricError::SinkUnavailable(format!("Failed to receive flush response: {e}"))
        })
    }

    pub async fn get_entry_by_id(
        &self,
        id: &str,
    ) -> Result<Option<RelationshipMetric>, MetricError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(AggregatorCommand::GetEntryById {
                id: id.to_string(),
                response_tx,
            })
            .await
            .map_err(|e| {
                MetricError::SinkUnavailable(format!("Failed to send get_entry_by_id command: {e}"))
            })?;

        response_rx.await.map_err(|e| {
            MetricError::SinkUnavailable(format!("Failed to receive get_entry_by_id response: {e}"))
        })
    }

    pub async fn shutdown(&self) -> Result<(), MetricError> {
        self.tx
            .send(AggregatorCommand::Shutdown)
            .await
            .map_err(|e| MetricError::SinkUnavailable(format!("Failed to send shutdown command: {e}")))
    }
}

impl DispatchSink for AggregatorHandle {
    fn graph_key(&self) -> GraphKey {
        APPLICATION_REFERENCE_METRIC_GRAPH
    }

    fn submit(&self, metric: RelationshipMetric) -> Result<(), MetricError> {
        self.tx
            .try_send(AggregatorCommand::Insert(metric))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    MetricError::SinkUnavailable("aggregator channel is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    MetricError::SinkUnavailable("aggregator service has stopped".to_string())
                }
            })
    }
}

pub struct AggregatorService {
    aggregator: ReferenceMetricAggregator,
    rx: mpsc::Receiver<AggregatorCommand>,
}

impl AggregatorService {
    pub fn new(aggregator: ReferenceMetricAggregator, buffer_size: usize) -> (Self, AggregatorHandle) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { aggregator, rx }, AggregatorHandle { tx })
    }

    pub async fn run(mut self) {
        debug!("Aggregator service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                AggregatorCommand::Insert(metric) => {
                    if let Err(e) = self.aggregator.insert(metric) {
                        warn!("Dropping application reference metric: {e}");
                    }
                }

                AggregatorCommand::Flush(response_tx) => {
                    let metrics = self.aggregator.consume_metrics();
                    if response_tx.send(metrics).is_err() {
                        error!("Failed to send flush response - receiver dropped");
                    }
                }

                AggregatorCommand::GetEntryById { id, response_tx } => {
                    let entry = self.aggregator.get_entry_by_id(&id).cloned();
                    if response_tx.send(entry).is_err() {
                        error!("Failed to send get_entry_by_id response - receiver dropped");
                    }
                }

                AggregatorCommand::Shutdown => {
                    debug!("Aggregator service shutting down");
                    break;
                }
            }
        }

        debug!("Aggregator service stopped");
    }
}
