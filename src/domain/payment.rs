use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorName {
    Default,
    Fallback,
}

impl ProcessorName {
    pub const ALL: [ProcessorName; 2] = [ProcessorName::Default, ProcessorName::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorName::Default => "default",
            ProcessorName::Fallback => "fallback",
        }
    }

    pub fn fee(&self) -> Decimal {
        match self {
            ProcessorName::Default => dec!(0.05),
            ProcessorName::Fallback => dec!(0.10),
        }
    }
}

impl fmt::Display for ProcessorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(ProcessorName::Default),
            "fallback" => Ok(ProcessorName::Fallback),
            other => Err(anyhow::anyhow!("unknown processor name: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub request: PaymentRequest,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
}

impl PaymentEvent {
    pub fn new(request: PaymentRequest, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            request,
            enqueued_at,
            attempts: 0,
        }
    }

    pub fn retried(&self) -> Self {
        Self {
            request: self.request.clone(),
            enqueued_at: self.enqueued_at,
            attempts: self.attempts.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    #[serde(with = "two_decimals")]
    pub amount: Decimal,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTime<Utc>,
}

impl From<&PaymentEvent> for PaymentSubmission {
    fn from(event: &PaymentEvent) -> Self {
        Self {
            correlation_id: event.request.correlation_id,
            amount: event.request.amount,
            requested_at: event.enqueued_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorTotals {
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "totalAmount", with = "two_decimals")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub default: ProcessorTotals,
    pub fallback: ProcessorTotals,
}

impl PaymentSummary {
    pub fn default_total_requests(&self) -> u64 {
        self.default.total_requests
    }

    pub fn default_total_amount(&self) -> Decimal {
        self.default.total_amount
    }

    pub fn fallback_total_requests(&self) -> u64 {
        self.fallback.total_requests
    }

    pub fn fallback_total_amount(&self) -> Decimal {
        self.fallback.total_amount
    }
}

pub mod two_decimals {
    use rust_decimal::{Decimal, RoundingStrategy};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rust_decimal::serde::arbitrary_precision::serialize(&rounded, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::arbitrary_precision::deserialize(deserializer)
    }
}
