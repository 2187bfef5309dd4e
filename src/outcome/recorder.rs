use crate::domain::payment::{PaymentSummary, ProcessorName};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

pub const RECORD_RETENTION_SECS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeBucket {
    Processor(ProcessorName),
    Failed,
}

impl OutcomeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeBucket::Processor(p) => p.as_str(),
            OutcomeBucket::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub bucket: OutcomeBucket,
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait OutcomeRecorder: Send + Sync {
    async fn save_payment(&self, outcome: &PaymentOutcome) -> Result<()>;

    async fn summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentSummary>;
}

pub fn range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        _ => None,
    }
}
