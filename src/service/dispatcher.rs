use crate::domain::payment::{PaymentEvent, PaymentRequest, ProcessorName};
use crate::election::selector::ProcessorSelector;
use crate::gateways::Gateways;
use crate::outcome::recorder::{OutcomeBucket, OutcomeRecorder, PaymentOutcome};
use crate::service::retry_orchestrator::{after_failure, RetryDirective, RetryPolicy};
use crate::service::retry_queue::RetryQueue;
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered(ProcessorName),
    Requeued { attempts: u32 },
    DeadLettered,
}

#[derive(Clone)]
pub struct PaymentDispatcher {
    pub queue: Arc<RetryQueue>,
    pub selector: ProcessorSelector,
    pub gateways: Gateways,
    pub recorder: Arc<dyn OutcomeRecorder>,
    pub retry_policy: RetryPolicy,
}

impl PaymentDispatcher {
    pub async fn enqueue_payment(&self, request: PaymentRequest) -> Result<()> {
        self.queue
            .push(PaymentEvent::new(request, chrono::Utc::now()))
            .await
    }

    pub fn spawn_workers(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|worker| {
                let dispatcher = self.clone();
                tokio::spawn(async move { dispatcher.run_worker(worker).await })
            })
            .collect()
    }

    async fn run_worker(self, worker: usize) {
        tracing::debug!(worker, "dispatch worker started");
        while let Some(event) = self.queue.pop().await {
            self.dispatch(event).await;
        }
        tracing::debug!(worker, "dispatch worker stopped");
    }

    pub async fn dispatch(&self, event: PaymentEvent) -> DispatchOutcome {
        let processor = self.selector.select_best_processor().await;
        let gateway = self.gateways.get(processor);

        match gateway.process_payment(&event).await {
            Ok(()) => {
                self.record(OutcomeBucket::Processor(processor), &event).await;
                DispatchOutcome::Delivered(processor)
            }
            Err(e) => {
                tracing::debug!(
                    correlation_id = %event.request.correlation_id,
                    attempts = event.attempts,
                    "dispatch failed: {}",
                    e
                );
                self.handle_failure(event).await
            }
        }
    }

    async fn handle_failure(&self, event: PaymentEvent) -> DispatchOutcome {
        match after_failure(&event, &self.retry_policy) {
            RetryDirective::Requeue(next) => {
                let attempts = next.attempts;
                match self.queue.push(next).await {
                    Ok(()) => DispatchOutcome::Requeued { attempts },
                    Err(e) => {
                        tracing::warn!(
                            correlation_id = %event.request.correlation_id,
                            "cannot requeue payment, dead-lettering: {:#}",
                            e
                        );
                        self.dead_letter(&event).await
                    }
                }
            }
            RetryDirective::DeadLetter => {
                tracing::warn!(
                    correlation_id = %event.request.correlation_id,
                    attempts = event.attempts + 1,
                    "payment exhausted its retries"
                );
                self.dead_letter(&event).await
            }
        }
    }

    async fn dead_letter(&self, event: &PaymentEvent) -> DispatchOutcome {
        self.record(OutcomeBucket::Failed, event).await;
        DispatchOutcome::DeadLettered
    }

    async fn record(&self, bucket: OutcomeBucket, event: &PaymentEvent) {
        let outcome = PaymentOutcome {
            bucket,
            correlation_id: event.request.correlation_id,
            amount: event.request.amount,
            timestamp: event.enqueued_at,
        };
        if let Err(e) = self.recorder.save_payment(&outcome).await {
            tracing::error!(
                bucket = %bucket,
                correlation_id = %event.request.correlation_id,
                "failed to record payment outcome: {:#}",
                e
            );
        }
    }
}
