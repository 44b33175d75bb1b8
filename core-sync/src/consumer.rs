//! # Queue Consumer
//!
//! Drains the durable work queue and invokes the derivative pipeline per
//! message, reporting partial batch success.
//!
//! ## Overview
//!
//! Each message moves through `Received → Processing → {Success, Failed}`.
//! Messages of a batch are processed concurrently; there is no ordering
//! dependency between distinct files and no cross-message transaction. A
//! failed message is released back to the queue for redelivery under the
//! queue's own retry policy; successes are acknowledged. One file's failure
//! never blocks or rolls back another's success, which keeps a single
//! multi-GB transcode from stalling the whole batch.

use bridge_traits::queue::{QueueMessage, WorkQueue};
use core_runtime::config::MirrorConfig;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::dispatch::WorkItem;
use crate::error::{Result, SyncError};
use crate::pipeline::DerivativePipeline;

/// Outcome of one consumer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Messages received in this batch.
    pub received: usize,
    /// Messages processed and acknowledged.
    pub succeeded: usize,
    /// Identifiers of messages released for redelivery.
    pub failed_ids: Vec<String>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failed_ids.len()
    }
}

/// Consumer over the durable work queue.
pub struct QueueConsumer {
    queue: Arc<dyn WorkQueue>,
    pipeline: Arc<DerivativePipeline>,
    batch_size: u32,
    message_timeout: Duration,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        pipeline: Arc<DerivativePipeline>,
        config: &MirrorConfig,
    ) -> Self {
        Self {
            queue,
            pipeline,
            batch_size: config.batch_size,
            message_timeout: Duration::from_secs(config.message_timeout_secs),
        }
    }

    /// Receive one batch, process all messages concurrently, and settle each
    /// one individually.
    #[instrument(skip(self))]
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let messages = self
            .queue
            .receive(self.batch_size)
            .await
            .map_err(|e| SyncError::Queue(e.to_string()))?;

        if messages.is_empty() {
            return Ok(BatchReport::default());
        }

        info!(count = messages.len(), "Processing queue batch");

        let outcomes = join_all(
            messages
                .iter()
                .map(|message| self.handle_message(message)),
        )
        .await;

        let mut report = BatchReport {
            received: messages.len(),
            ..Default::default()
        };

        for (message, success) in messages.iter().zip(outcomes) {
            if success {
                report.succeeded += 1;
                if let Err(e) = self.queue.acknowledge(&message.id).await {
                    warn!(id = %message.id, error = %e, "Failed to acknowledge message");
                }
            } else {
                report.failed_ids.push(message.id.clone());
                if let Err(e) = self.queue.release(&message.id).await {
                    warn!(id = %message.id, error = %e, "Failed to release message");
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed(),
            "Batch complete"
        );
        Ok(report)
    }

    /// Run batches until the queue reports empty, accumulating a report.
    pub async fn drain(&self) -> Result<BatchReport> {
        let mut total = BatchReport::default();
        loop {
            let report = self.run_batch().await?;
            if report.received == 0 {
                return Ok(total);
            }
            total.received += report.received;
            total.succeeded += report.succeeded;
            total.failed_ids.extend(report.failed_ids);

            // Failed messages were released back to pending; stop once a
            // batch makes no forward progress so redelivery happens on a
            // later invocation instead of a hot loop.
            if report.succeeded == 0 {
                return Ok(total);
            }
        }
    }

    /// Process one message. Returns whether it succeeded.
    async fn handle_message(&self, message: &QueueMessage) -> bool {
        debug!(id = %message.id, "Message received");

        let item: WorkItem = match serde_json::from_str(&message.body) {
            Ok(item) => item,
            Err(e) => {
                error!(id = %message.id, error = %e, "Malformed message body");
                return false;
            }
        };

        debug!(id = %message.id, key = %item.derived_key, "Message processing");

        match timeout(self.message_timeout, self.pipeline.process(&item)).await {
            Ok(Ok(())) => {
                debug!(id = %message.id, "Message succeeded");
                true
            }
            Ok(Err(e)) => {
                error!(id = %message.id, key = %item.derived_key, error = %e, "Message failed");
                false
            }
            Err(_) => {
                error!(
                    id = %message.id,
                    key = %item.derived_key,
                    timeout_secs = self.message_timeout.as_secs(),
                    "Message timed out"
                );
                false
            }
        }
    }
}
