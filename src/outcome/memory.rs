use crate::domain::payment::{PaymentSummary, ProcessorName, ProcessorTotals};
use crate::outcome::recorder::{range, OutcomeBucket, OutcomeRecorder, PaymentOutcome, RECORD_RETENTION_SECS};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Ledger {
    totals: HashMap<OutcomeBucket, ProcessorTotals>,
    records: Vec<PaymentOutcome>,
}

#[derive(Clone, Default)]
pub struct InMemoryOutcomeRecorder {
    inner: Arc<Mutex<Ledger>>,
}

impl InMemoryOutcomeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn totals(&self, bucket: OutcomeBucket) -> ProcessorTotals {
        self.inner
            .lock()
            .await
            .totals
            .get(&bucket)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn records(&self) -> Vec<PaymentOutcome> {
        self.inner.lock().await.records.clone()
    }
}

#[async_trait::async_trait]
impl OutcomeRecorder for InMemoryOutcomeRecorder {
    async fn save_payment(&self, outcome: &PaymentOutcome) -> Result<()> {
        let mut ledger = self.inner.lock().await;
        let totals = ledger.totals.entry(outcome.bucket).or_default();
        totals.total_requests += 1;
        totals.total_amount += outcome.amount;
        let cutoff = Utc::now() - chrono::Duration::seconds(RECORD_RETENTION_SECS);
        ledger.records.retain(|r| r.timestamp >= cutoff);
        ledger.records.push(outcome.clone());
        Ok(())
    }

    async fn summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentSummary> {
        let ledger = self.inner.lock().await;
        let totals_for = |processor: ProcessorName| -> ProcessorTotals {
            let bucket = OutcomeBucket::Processor(processor);
            match range(from, to) {
                None => ledger.totals.get(&bucket).cloned().unwrap_or_default(),
                Some((from, to)) => ledger
                    .records
                    .iter()
                    .filter(|r| r.bucket == bucket && r.timestamp >= from && r.timestamp <= to)
                    .fold(ProcessorTotals::default(), |mut acc, r| {
                        acc.total_requests += 1;
                        acc.total_amount += r.amount;
                        acc
                    }),
            }
        };

        Ok(PaymentSummary {
            default: totals_for(ProcessorName::Default),
            fallback: totals_for(ProcessorName::Fallback),
        })
    }
}
