//! Outbound deferred jobs.
//!
//! The core never talks to mail transport or PDF rendering directly; after a
//! committed state change it enqueues a job and an external worker drains
//! the queue. Payloads carry ids, not snapshots, so a retried job re-reads
//! current state and stays idempotent-safe.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// A deferred side effect handed to the external worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundJob {
    /// Render the invoice document for a purchase and mail it to the buyer
    RenderAndEmailInvoice {
        /// Purchase to render
        purchase_id: i64,
    },
    /// Send the templated payment-received notification
    SendPaymentNotification {
        /// Purchase the payment belongs to
        purchase_id: i64,
        /// Rendered `Name <email>` receiver strings
        recipients: Vec<String>,
    },
}

/// Producer handle for the outbound job queue.
///
/// Enqueueing is non-blocking (unbounded channel); the consumer half is
/// handed to whatever drains jobs in the hosting process.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<OutboundJob>,
}

impl JobQueue {
    /// Creates a queue, returning the producer handle and the consumer end.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueues a job for the external worker.
    ///
    /// # Errors
    /// Fails only if the consumer end has been dropped.
    pub fn enqueue(&self, job: OutboundJob) -> Result<()> {
        info!("Enqueueing outbound job: {:?}", job);
        self.sender.send(job).map_err(|e| Error::JobQueue {
            message: e.to_string(),
        })
    }
}
