//! Background CRM delivery
//!
//! Classified leads are pushed onto a bounded channel and delivered by a
//! single worker task. Delivery is attempted once per lead; failures and
//! drops are logged and counted.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lead_qualifier_core::{CrmAdapter, Lead};

/// What happened to a lead handed to [`DeliveryQueue::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// Queue full or worker gone
    Dropped,
}

/// Totals reported by the worker when it exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::Sender<Lead>,
}

impl DeliveryQueue {
    /// Start the delivery worker
    ///
    /// The worker runs until every queue handle is dropped and the channel
    /// has drained.
    pub fn spawn(
        backend: Arc<dyn CrmAdapter>,
        capacity: usize,
    ) -> (Self, JoinHandle<DeliveryStats>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(backend, rx));
        (Self { tx }, handle)
    }

    /// Hand a lead to the worker without waiting
    pub fn enqueue(&self, lead: Lead) -> EnqueueOutcome {
        let lead_id = lead.id();
        match self.tx.try_send(lead) {
            Ok(()) => EnqueueOutcome::Enqueued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(lead_id = %lead_id, "CRM delivery queue full, dropping lead");
                metrics::counter!("lead_qualifier_crm_dropped_total", "reason" => "full").increment(1);
                EnqueueOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(lead_id = %lead_id, "CRM delivery worker stopped, dropping lead");
                metrics::counter!("lead_qualifier_crm_dropped_total", "reason" => "closed").increment(1);
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Free slots left in the queue
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }
}

async fn run_worker(backend: Arc<dyn CrmAdapter>, mut rx: mpsc::Receiver<Lead>) -> DeliveryStats {
    let crm = backend.name();
    let mut stats = DeliveryStats::default();
    tracing::info!(crm, "CRM delivery worker started");

    while let Some(lead) = rx.recv().await {
        match backend.update_lead(&lead).await {
            Ok(()) => {
                stats.delivered += 1;
                metrics::counter!("lead_qualifier_crm_deliveries_total", "crm" => crm, "outcome" => "success")
                    .increment(1);
                tracing::debug!(lead_id = %lead.id(), crm, "Lead delivered to CRM");
            }
            Err(e) => {
                stats.failed += 1;
                metrics::counter!("lead_qualifier_crm_deliveries_total", "crm" => crm, "outcome" => "failure")
                    .increment(1);
                tracing::error!(lead_id = %lead.id(), crm, error = %e, "CRM delivery failed");
            }
        }
    }

    tracing::info!(
        crm,
        delivered = stats.delivered,
        failed = stats.failed,
        "CRM delivery worker stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lead_qualifier_core::{ClassificationResult, EngagementMetrics, IntegrationError, LeadStatus, NewLead};
    use parking_lot::Mutex;
    use serde_json::Value;
    use tokio::sync::{Notify, Semaphore};

    fn lead(email: &str) -> Lead {
        NewLead::new(email, "Test Lead", EngagementMetrics::default())
            .unwrap()
            .finalize(&ClassificationResult {
                status: LeadStatus::Warm,
                score: 60,
                confidence: 0.7,
            })
    }

    #[derive(Default)]
    struct Recording {
        emails: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl CrmAdapter for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError> {
            if self.fail_on.as_deref() == Some(lead.email()) {
                return Err(IntegrationError::ConnectionFailed("boom".to_string()));
            }
            self.emails.lock().push(lead.email().to_string());
            Ok(())
        }

        async fn get_lead(&self, _email: &str) -> Result<Option<Value>, IntegrationError> {
            Ok(None)
        }

        async fn create_task(&self, _lead: &Lead) -> Result<(), IntegrationError> {
            Ok(())
        }
    }

    struct Gated {
        started: Notify,
        release: Semaphore,
    }

    #[async_trait]
    impl CrmAdapter for Gated {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn update_lead(&self, _lead: &Lead) -> Result<(), IntegrationError> {
            self.started.notify_one();
            let permit = self
                .release
                .acquire()
                .await
                .map_err(|e| IntegrationError::Internal(e.to_string()))?;
            permit.forget();
            Ok(())
        }

        async fn get_lead(&self, _email: &str) -> Result<Option<Value>, IntegrationError> {
            Ok(None)
        }

        async fn create_task(&self, _lead: &Lead) -> Result<(), IntegrationError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_delivers_in_order_and_drains_on_drop() {
        let backend = Arc::new(Recording::default());
        let (queue, handle) = DeliveryQueue::spawn(backend.clone(), 8);

        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            assert_eq!(queue.enqueue(lead(email)), EnqueueOutcome::Enqueued);
        }
        drop(queue);

        let stats = handle.await.unwrap();
        assert_eq!(stats, DeliveryStats { delivered: 3, failed: 0 });
        assert_eq!(
            *backend.emails.lock(),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[tokio::test]
    async fn test_failure_is_counted_and_not_retried() {
        let backend = Arc::new(Recording {
            fail_on: Some("bad@example.com".to_string()),
            ..Default::default()
        });
        let (queue, handle) = DeliveryQueue::spawn(backend.clone(), 4);

        queue.enqueue(lead("bad@example.com"));
        queue.enqueue(lead("good@example.com"));
        drop(queue);

        let stats = handle.await.unwrap();
        assert_eq!(stats, DeliveryStats { delivered: 1, failed: 1 });
        assert_eq!(*backend.emails.lock(), vec!["good@example.com"]);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let backend = Arc::new(Gated {
            started: Notify::new(),
            release: Semaphore::new(0),
        });
        let (queue, handle) = DeliveryQueue::spawn(backend.clone(), 1);

        assert_eq!(queue.enqueue(lead("one@example.com")), EnqueueOutcome::Enqueued);
        backend.started.notified().await;

        // Worker is busy with the first lead; one slot left
        assert_eq!(queue.enqueue(lead("two@example.com")), EnqueueOutcome::Enqueued);
        assert_eq!(queue.enqueue(lead("three@example.com")), EnqueueOutcome::Dropped);

        backend.release.add_permits(2);
        drop(queue);
        let stats = handle.await.unwrap();
        assert_eq!(stats.delivered, 2);
    }

    #[tokio::test]
    async fn test_closed_worker_drops() {
        let backend = Arc::new(Recording::default());
        let (queue, handle) = DeliveryQueue::spawn(backend, 2);
        handle.abort();
        let _ = handle.await;
        assert_eq!(queue.enqueue(lead("late@example.com")), EnqueueOutcome::Dropped);
    }
}
